//! Headless симуляция Watchpost
//!
//! Охранник патрулирует маршрут, зомби бродит рядом. Через 3 секунды
//! появляется игрок, через 6 - пожар на маршруте.

use bevy::math::bounding::Aabb3d;
use bevy::prelude::*;
use watchpost_simulation::behaviors::PatrolRoute;
use watchpost_simulation::{
    create_headless_app, log, spawn_agent, spawn_obstacle, spawn_target, ActiveBehavior, AgentProfile,
    ControllerProfile, HazardDirectory, PatrolConfig, SimulationPlugin, ZombieConfig,
};

fn main() {
    let seed = 42;
    log(&format!("Starting Watchpost headless simulation (seed: {})", seed));

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);

    let guard = AgentProfile {
        name: "guard".to_string(),
        controller: ControllerProfile::Patrol(PatrolConfig {
            route: Some(PatrolRoute {
                waypoints: vec![
                    Vec3::new(0.0, 0.0, 0.0),
                    Vec3::new(10.0, 0.0, 0.0),
                    Vec3::new(10.0, 0.0, 10.0),
                ],
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    };
    let walker = AgentProfile {
        name: "walker".to_string(),
        controller: ControllerProfile::Zombie(ZombieConfig::default()),
        ..Default::default()
    };

    {
        let mut commands = app.world_mut().commands();
        spawn_agent(&mut commands, &guard, Vec3::ZERO);
        spawn_agent(&mut commands, &walker, Vec3::new(-15.0, 0.0, 5.0));
        spawn_obstacle(&mut commands, Vec3::new(5.0, 1.0, 5.0), Vec3::new(1.0, 1.0, 1.0));
    }
    app.world_mut().flush();

    // 10 секунд при 60Hz
    for tick in 0..600 {
        if tick == 180 {
            {
                let mut commands = app.world_mut().commands();
                spawn_target(&mut commands, Vec3::new(8.0, 0.0, 8.0), "player");
            }
            app.world_mut().flush();
        }
        if tick == 360 {
            let mut directory = app.world_mut().resource_mut::<HazardDirectory>();
            let id = directory.add_hazard(
                Aabb3d::new(Vec3::new(10.0, 1.0, 5.0), Vec3::new(3.0, 2.0, 3.0)),
                "fire",
            );
            log(&format!("🔥 Hazard {:?} appeared", id));
        }

        app.update();

        if tick % 60 == 0 {
            let world = app.world_mut();
            let mut agents = world.query::<(&Name, &ActiveBehavior, &Transform)>();
            for (name, active, transform) in agents.iter(world) {
                log(&format!(
                    "Tick {}: {} [{}] at {:.1?}",
                    tick,
                    name,
                    active.label(),
                    transform.translation
                ));
            }
        }
    }

    log("Simulation complete!");
}
