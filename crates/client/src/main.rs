use std::time::{Duration, Instant};

use clap::Parser;
use glam::{Quat, Vec3};

use llmeta::{
    DEFAULT_DAMPING, DEFAULT_ROOM_NAME, DEFAULT_SEND_INTERVAL_MS, DEFAULT_SERVER_ENDPOINT, Euler,
    HandInput, HandPose, HandSample, HandSide, ProfileData, SyncConfig,
};
use llmeta_client::{ClientConfig, DEFAULT_JOIN_TIMEOUT_SECS, SyncClient};

const FRAME_INTERVAL: Duration = Duration::from_micros(16_667);
const ORBIT_RADIUS: f32 = 3.0;
const EYE_HEIGHT: f32 = 1.6;

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "Headless pose sync client")]
struct Args {
    #[arg(long, env = "LLMETA_SERVER_ENDPOINT", default_value = DEFAULT_SERVER_ENDPOINT)]
    endpoint: String,

    #[arg(long, env = "LLMETA_ROOM", default_value = DEFAULT_ROOM_NAME)]
    room: String,

    #[arg(long, default_value_t = DEFAULT_SEND_INTERVAL_MS, help = "Minimum ms between pose updates")]
    send_interval_ms: u64,

    #[arg(long, default_value_t = DEFAULT_DAMPING, help = "Interpolation damping factor")]
    damping: f32,

    #[arg(long, default_value_t = DEFAULT_JOIN_TIMEOUT_SECS)]
    join_timeout_secs: u64,

    #[arg(long, help = "Stop after this many seconds (runs until Ctrl-C if omitted)")]
    duration: Option<u64>,

    #[arg(long, help = "Pretend to be an XR headset with tracked hands")]
    xr: bool,
}

impl Args {
    fn client_config(&self) -> ClientConfig {
        ClientConfig {
            sync: SyncConfig {
                endpoint: self.endpoint.clone(),
                room_name: self.room.clone(),
                send_interval_ms: self.send_interval_ms,
                damping: self.damping,
            },
            join_timeout: Duration::from_secs(self.join_timeout_secs),
        }
    }
}

/// Synthetic local player walking a circle around the origin, facing its
/// direction of travel.
struct OrbitRig {
    angle: f32,
    xr: bool,
}

impl OrbitRig {
    fn advance(&mut self, dt: f32) {
        self.angle = (self.angle + dt * 0.5) % std::f32::consts::TAU;
    }
}

impl llmeta::TransformSource for OrbitRig {
    fn camera_world_position(&self) -> Vec3 {
        Vec3::new(
            ORBIT_RADIUS * self.angle.cos(),
            EYE_HEIGHT,
            ORBIT_RADIUS * self.angle.sin(),
        )
    }

    fn camera_world_rotation(&self) -> Quat {
        Quat::from_rotation_y(-self.angle)
    }

    fn hand(&self, side: HandSide) -> HandInput {
        if !self.xr || side == HandSide::Right {
            return HandSample::Untracked;
        }
        let wave = (self.angle * 8.0).sin() * 0.2;
        let position = self.camera_world_position()
            + self.camera_world_rotation() * Vec3::new(-0.3, -0.2 + wave, -0.4);
        HandSample::Tracked(HandPose::new(position, Euler::ZERO))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let mut client = SyncClient::new(args.client_config())?;
    if args.xr {
        client.set_profile(ProfileData::xr(true));
    }

    let session_id = client.connect().await?;
    log::info!("Connected to {} as {}", args.room, session_id);

    let mut rig = OrbitRig {
        angle: 0.0,
        xr: args.xr,
    };
    let started = Instant::now();
    let deadline = args.duration.map(|secs| started + Duration::from_secs(secs));
    let mut last_frame = started;
    let mut last_report = started;
    let mut ticker = tokio::time::interval(FRAME_INTERVAL);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut ctrl_c => {
                log::info!("Interrupted");
                break;
            }
        }

        let now = Instant::now();
        if deadline.is_some_and(|deadline| now >= deadline) {
            break;
        }
        if !client.is_connected() {
            log::warn!("Lost connection to room");
            break;
        }

        let dt = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;
        rig.advance(dt);
        let engine = client.frame(dt, now, &rig);

        if now.duration_since(last_report) >= Duration::from_secs(1) {
            last_report = now;
            log::info!("{} remote player(s)", engine.len());
            for player in engine.players() {
                let transforms = player.transforms();
                if !transforms.visible {
                    log::info!("  {} hidden", player.session_id);
                    continue;
                }
                let head = transforms.head.position;
                log::info!(
                    "  {} head=({:.2}, {:.2}, {:.2}) xr={} hands={}",
                    player.session_id,
                    head.x,
                    head.y,
                    head.z,
                    player.is_xr,
                    transforms.show_left_hand || transforms.show_right_hand,
                );
            }
        }
    }

    let stats = client.stats();
    log::info!(
        "Sent {} messages ({} bytes), received {} ({} bytes), dropped {}",
        stats.messages_sent,
        stats.bytes_sent,
        stats.messages_received,
        stats.bytes_received,
        stats.messages_dropped,
    );
    client.close().await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_name_matches_binary() {
        assert_eq!(Args::command().get_name(), env!("CARGO_BIN_NAME"));
    }
}
