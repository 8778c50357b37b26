//! Renders a sample scene to a PPM file.
//!
//! Runs a reduced final pass over a small demo layout (a mirror wall, a glass
//! circle, and a prism) and writes the last snapshot to `preview.ppm`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use lumen2d::{
    CircleShape, FractionalLightColor, ImageBuffer, Light, LightColor, PolygonShape,
    ShapeAttributes, SimulationLayout, SimulationSize, SimulationSnapshot, Simulator,
    SimulatorOptions, Vec2, Wall,
};

const SEGMENT_BUDGET: u64 = 500_000;

fn main() -> std::io::Result<()> {
    let latest: Arc<Mutex<Option<SimulationSnapshot>>> = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&latest);

    let options = SimulatorOptions {
        final_segment_budget: SEGMENT_BUDGET,
        ..SimulatorOptions::default()
    };
    let simulator = Simulator::new(
        SimulationSize::new(640, 480),
        0.55,
        options,
        move |snapshot| {
            *sink.lock().unwrap() = Some(snapshot);
        },
    );
    simulator.restart(demo_layout(), false);

    loop {
        thread::sleep(Duration::from_millis(100));
        let traced = latest
            .lock()
            .unwrap()
            .as_ref()
            .map_or(0, |snapshot| snapshot.total_segments_traced);
        if traced >= SEGMENT_BUDGET {
            break;
        }
    }

    let snapshot = latest
        .lock()
        .unwrap()
        .take()
        .expect("a snapshot must exist once the budget is reached");
    write_ppm("preview.ppm", &snapshot.image)?;
    println!(
        "wrote preview.ppm ({} segments traced)",
        snapshot.total_segments_traced
    );
    Ok(())
}

fn demo_layout() -> SimulationLayout {
    let mut layout = SimulationLayout::new(1);
    layout
        .lights
        .push(Light::new(Vec2::new(160.0, 240.0), LightColor::new(255, 235, 200)));
    // A slightly reddish mirror along the top.
    layout.walls.push(Wall::new(
        Vec2::new(80.0, 80.0),
        Vec2::new(560.0, 120.0),
        ShapeAttributes::opaque(FractionalLightColor::new(0.1, 0.3, 0.3), 0.05),
    ));
    // A glass circle in the middle of the scene.
    layout.circles.push(CircleShape::new(
        Vec2::new(360.0, 260.0),
        70.0,
        ShapeAttributes::refractive(FractionalLightColor::splat(0.05), 0.0, 1.5),
    ));
    // A diffuse prism near the bottom right.
    layout.polygons.push(PolygonShape::new(
        vec![
            Vec2::new(480.0, 400.0),
            Vec2::new(590.0, 430.0),
            Vec2::new(520.0, 320.0),
        ],
        ShapeAttributes::refractive(FractionalLightColor::splat(0.15), 0.2, 1.4),
    ));
    layout
}

fn write_ppm(path: &str, image: &ImageBuffer) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "P6\n{} {}\n255", image.width, image.height)?;
    for pixel in image.pixels.chunks_exact(4) {
        out.write_all(&pixel[..3])?;
    }
    Ok(())
}
