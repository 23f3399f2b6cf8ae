use anyhow::Result;
use featuretrack::prelude::*;
use featuretrack::test_stuff::DriftingBlobsScene;

/// Corner detection + Kalman state estimation over a synthetic scene of
/// drifting blobs. Measured (flow) and estimated (bank) positions are printed
/// side by side; watch the estimates coast when corrections are sparse.
fn main() -> Result<()> {
    env_logger::init();

    let scene = DriftingBlobsScene::new(
        128,
        128,
        vec![(30.0, 30.0), (90.0, 40.0), (50.0, 90.0)],
        (0.8, 0.4),
        0.1,
    )
    .take(40);

    let mut session = SessionOptions::default()
        .interval(20)
        .corner_detector(3, 0.2, 10.0, 3)
        .state_estimation(StateEstimationOptions {
            correction_period: 4,
            ..StateEstimationOptions::default()
        })
        .build(scene)?;

    session.run(|out| {
        let phase = match out.phase {
            TickPhase::Detect => "DETECT",
            TickPhase::Track => "TRACK ",
        };
        print!("tick {:3} [{phase}]", out.tick);
        for p in &out.points {
            print!("  est ({:6.1}, {:6.1})", p.x, p.y);
        }
        if let Some(gt) = &out.ground_truth {
            for p in gt {
                print!("  gt ({:6.1}, {:6.1})", p.x, p.y);
            }
        }
        println!();
    })?;

    Ok(())
}
