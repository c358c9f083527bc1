use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::SkinId;

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("skin {0:?} is not installed or was disposed")]
    UnknownSkin(SkinId),
    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: SkinId, child: SkinId },
    #[error("skin {0:?} is already attached to a parent")]
    AlreadyAttached(SkinId),
    #[error("layout engine error: {0}")]
    Taffy(#[from] taffy::TaffyError),
}

/// A skin that panicked inside its position pass for the reported frame.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutFailure {
    pub skin: SkinId,
    pub name: &'static str,
    pub message: String,
}

/// Runs `f`, turning a panic into `Err(message)`.
pub(crate) fn guarded<R>(what: &str, name: &'static str, f: impl FnOnce() -> R) -> Result<R, String> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(r) => Ok(r),
        Err(err) => {
            let message = panic_message(&*err);
            log::error!("{name}: {what} panicked: {message}");
            Err(message)
        }
    }
}

fn panic_message(err: &(dyn Any + Send)) -> String {
    if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    }
}
