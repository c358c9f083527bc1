use std::path::Path;

use anyhow::Context as _;
use trellis_core::prelude::*;
use trellis_core::{Duration, TestClock};
use trellis_devtools::LayoutInspector;
use trellis_skins::*;

const FRAME: Duration = Duration::from_millis(16);

fn load_config(path: Option<&Path>) -> anyhow::Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading session config {}", path.display()))?;
    let config = serde_json::from_str(&raw)
        .with_context(|| format!("parsing session config {}", path.display()))?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let arg = std::env::args().nth(1);
    let config = load_config(arg.as_deref().map(Path::new))?;
    log::info!("render scale {}, snapping {}", config.render_scale, config.snap_to_pixel);

    let clock = TestClock::new();
    let mut session = FrameScheduler::with_clock(config, clock.clone());

    let section = TitledPane::new("Gallery");
    let column = ToolBar::vertical();
    column.spacing.set(8.0);
    column.control.padding().set(Insets::uniform(8.0));
    let caption = Label::new("Volume");
    let slider = Slider::new(0.0, 100.0, 40.0);
    let busy = ProgressIndicator::new(ProgressIndicator::INDETERMINATE);
    let pane = ScrollPane::new();
    pane.fit_to_width.set(true);
    let notes = Label::wrapping(
        "Skins observe their widget's properties and relay out only when asked to, \
         once per frame, after every change of the frame has been handled.",
    );

    let s = session.install(TitledPaneSkin::new(section.clone()));
    let col = session.install(ToolBarSkin::new(column));
    let cap = session.install(LabelSkin::new(caption.clone()));
    let sl = session.install(SliderSkin::new(slider.clone()));
    let pr = session.install(ProgressSkin::new(busy.clone()));
    let sp = session.install(ScrollPaneSkin::new(pane.clone()));
    let nt = session.install(LabelSkin::new(notes));
    session.attach_child(s, col)?;
    for item in [cap, sl, pr, sp] {
        session.attach_child(col, item)?;
    }
    session.attach_child(sp, nt)?;
    session.set_root(s, Rect::new(16.0, 16.0, 240.0, 260.0))?;

    let mut inspector = LayoutInspector::new();
    inspector.hud.toggle_inspector();

    for frame in 0..24 {
        match frame {
            4 => slider.set_value(150.0),
            8 => caption.text.set("Volume (max)".into()),
            12 => busy.progress.set(0.6),
            14 => pane.vvalue.set(1.0),
            16 => section.expanded.set(false),
            _ => {}
        }
        let report = session.pulse();
        if !report.is_idle() {
            log::debug!(
                "frame {}: dispatched {} laid out {}",
                report.frame,
                report.dispatched,
                report.laid_out.len()
            );
        }
        if frame == 23 {
            let mut scene = session.paint();
            inspector.frame(&session, &report, &mut scene);
            println!("{}", LayoutInspector::dump(&session));
            print!("{}", scene.describe());
        }
        clock.advance(FRAME);
    }
    Ok(())
}
