// Flies one drone of the square formation against the simulated flight controller.
//
// Each drone of the formation runs this program with its own DRONE_NUMBER, 1 to 4, selecting the corner of the
// square it holds. Ctrl-C stops the mission where it is, without landing.
//
// Run with RUST_LOG=debug to follow the telemetry polling.

use formation_flight::simulator::{SimConfig, SimulatedDrone};
use formation_flight::subsystems::formation::FormationSlot;
use formation_flight::subsystems::mission::{Mission, MissionConfig};
use formation_flight::{shutdown, Error};

// Set to 1, 2, 3 or 4
const DRONE_NUMBER: u8 = 1;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let slot = FormationSlot::from_number(DRONE_NUMBER)?;
    let shutdown = shutdown::on_ctrl_c();

    let drone = SimulatedDrone::spawn(SimConfig::default());

    let mut mission = Mission::new(&drone, slot, MissionConfig::default(), shutdown);
    let result = mission.run().await;

    drone.disconnect().await;

    match result {
        Ok(()) => Ok(()),
        Err(Error::Interrupted) => {
            log::debug!("Mission aborted during {:?}", mission.stage());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
