//! Widgets and their skins, built on `trellis-core`.
//!
//! Each module pairs a widget (a `Control` plus its properties) with one skin.
//! Widgets are shared as `Rc`; hand a clone to the skin and keep one to drive
//! the properties:
//!
//! ```rust
//! use trellis_core::*;
//! use trellis_skins::{Slider, SliderSkin};
//!
//! let mut session = FrameScheduler::new(SessionConfig::default());
//! let slider = Slider::new(0.0, 10.0, 2.5);
//! let id = session.install(SliderSkin::new(slider.clone()));
//! session.set_root(id, Rect::new(0.0, 0.0, 140.0, 20.0)).unwrap();
//! session.pulse();
//!
//! slider.set_value(5.0);
//! assert_eq!(session.pulse().laid_out, vec![id]);
//! ```
//!
//! Container skins (`ScrollPane`, `ToolBar`, `TitledPane`) lay out children
//! attached with `FrameScheduler::attach_child`.

pub mod label;
pub mod progress;
pub mod region;
pub mod scroll_pane;
pub mod slider;
pub mod titled_pane;
pub mod tool_bar;

pub use label::{Label, LabelProperty, LabelSkin};
pub use progress::{ProgressIndicator, ProgressProperty, ProgressSkin};
pub use region::{Region, RegionProperty, RegionSkin};
pub use scroll_pane::{ScrollPane, ScrollPaneProperty, ScrollPaneSkin};
pub use slider::{Slider, SliderProperty, SliderSkin};
pub use titled_pane::{TitledPane, TitledPaneProperty, TitledPaneSkin};
pub use tool_bar::{ToolBar, ToolBarProperty, ToolBarSkin};
