use anyhow::Result;
use featuretrack::prelude::*;
use featuretrack::test_stuff::TexturedScene;

/// Descriptor extraction + re-matching against the baseline captured at each
/// detection tick. The surviving match count shrinks as the texture drifts
/// away from the baseline and snaps back on re-detection.
fn main() -> Result<()> {
    env_logger::init();

    let scene = TexturedScene::new(128, 128, (1.2, -0.6), 30);

    let mut session = SessionOptions::default()
        .interval(10)
        .descriptor_detector(12)
        .descriptor_rematch(6.0)
        .build(scene)?;

    session.run(|out| {
        match (&out.phase, &out.matches) {
            (TickPhase::Detect, _) => {
                println!("tick {:3} [DETECT] {} keypoints", out.tick, out.points.len());
            }
            (TickPhase::Track, Some(matches)) => {
                let worst = matches
                    .iter()
                    .map(|m| m.distance)
                    .fold(0.0f32, f32::max);
                println!(
                    "tick {:3} [TRACK ] {} matched, worst distance {:.3}",
                    out.tick,
                    matches.len(),
                    worst
                );
            }
            (TickPhase::Track, None) => unreachable!(),
        };
    })?;

    Ok(())
}
