//! Tilebound headless driver
//!
//! Builds a small level, feeds a scripted input sequence through the fixed
//! timestep clock and logs what the simulation reports.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use glam::DVec2;
    use std::path::Path;
    use tilebound::Tuning;
    use tilebound::consts::SIM_DT;
    use tilebound::sim::{FixedClock, GameEvent, HealthDelta, InputState, Tile, TickInput, World, tick};

    env_logger::init();
    log::info!("Tilebound (headless) starting...");

    let tuning = Tuning::load_or_default(Path::new("tuning.json"));
    let mut world = World::new(0x5eed, tuning);

    // Floor, a pillar to wall-jump off, and a breakable wall
    world.chunk.fill(0..=0, 0..=31, Tile::solid(1));
    world.chunk.fill(1..=4, 10..=10, Tile::solid(1));
    world.chunk.fill(1..=2, 24..=24, Tile::solid(2));

    let player = match world.spawn_player(DVec2::new(3.0, 2.0)) {
        Ok(id) => id,
        Err(e) => {
            log::error!("could not spawn player: {e}");
            return;
        }
    };
    match world.spawn_npc(DVec2::new(16.0, 6.0)) {
        Ok(id) => log::info!("firefly {id} spawned"),
        Err(e) => log::warn!("running without a firefly: {e}"),
    }

    let script = |frame: u32| -> InputState {
        let mut inp = InputState::default();
        match frame {
            0..=59 => inp.x = 1,
            60..=63 => {
                inp.x = 1;
                inp.y = 1;
            }
            64..=69 => inp.x = 1,
            70..=74 => inp.y = 1,
            75..=119 => inp.x = -1,
            120..=121 => inp.action = true,
            122..=140 => inp.x = 1,
            141 => inp.action = true,
            _ => {}
        }
        inp
    };

    // Frames arrive at an uneven ~60 Hz; the clock turns them into 50 Hz ticks
    let mut clock = FixedClock::new();
    let mut frame = 0u32;
    while clock.ticks < 400 {
        let frame_seconds = if frame % 7 == 0 { SIM_DT * 1.9 } else { 1.0 / 60.0 };
        for _ in 0..clock.advance(frame_seconds) {
            // Stand-in for the external overlap test: fireballs hurt anything they touch except their shooter
            let hits: Vec<HealthDelta> = world
                .hitboxes()
                .iter()
                .flat_map(|hit| {
                    world
                        .hurtboxes()
                        .into_iter()
                        .filter(move |hurt| {
                            Some(hurt.owner) != hit.source
                                && hurt.pos.cmplt(hit.pos + hit.dim).all()
                                && hit.pos.cmplt(hurt.pos + hurt.dim).all()
                        })
                        .map(move |hurt| HealthDelta {
                            target: hurt.owner,
                            amount: -hit.damage,
                        })
                })
                .collect();

            let input = TickInput {
                players: vec![(player, script(frame))],
                health_deltas: hits,
            };
            tick(&mut world, &input);

            for event in &world.events {
                match event {
                    GameEvent::MovementChanged { from, to, .. } => {
                        log::info!("tick {}: {from:?} -> {to:?}", world.tick)
                    }
                    GameEvent::TileDestroyed { tile } => {
                        log::info!("tick {}: tile ({}, {}) destroyed", world.tick, tile.row, tile.col)
                    }
                    other => log::debug!("tick {}: {other:?}", world.tick),
                }
            }
        }
        frame += 1;
    }

    match world.ecs.entity(player) {
        Some(body) => log::info!(
            "finished {} ticks; player at ({:.2}, {:.2}) with {} contacts",
            world.tick,
            body.position.x,
            body.position.y,
            body.contacts.len()
        ),
        None => log::warn!("player vanished after {} ticks", world.tick),
    }

    // Rewind as far as the retained history allows
    if let Err(e) = world.rollback(world.history_len().saturating_sub(1)) {
        log::warn!("rollback failed: {e}");
    } else if let Some(body) = world.ecs.entity(player) {
        log::info!("rolled back to tick {}; player at {:?}", world.tick, body.position);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation core is a library; there is no browser driver
}
