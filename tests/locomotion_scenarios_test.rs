//! End-to-end locomotion scenarios through the public API: config-driven
//! worlds, stair classification, multi-jump and moving-platform carry.

use nalgebra::{UnitQuaternion, Vector3};

use locomotor::config::LocomotionConfig;
use locomotor::sim::physics::PhysicsWorld;
use locomotor::sim::types::SurfaceCategory;

const DT: f32 = 1.0 / 60.0;

fn flat_world() -> PhysicsWorld {
    let mut world = PhysicsWorld::new();
    world.add_part(
        1,
        Vector3::zeros(),
        UnitQuaternion::identity(),
        Vector3::new(50.0, 0.5, 50.0),
        true,
        SurfaceCategory::Ground,
    );
    world
}

fn settle(world: &mut PhysicsWorld, steps: usize) {
    for _ in 0..steps {
        world.step(DT);
    }
}

#[test]
fn test_config_driven_speed_cap() {
    let config: LocomotionConfig = toml::from_str(
        r#"
        max_speed = 4.0
        max_acceleration = 20.0
    "#,
    )
    .unwrap();
    let tuning = config.tuning().unwrap();

    let mut world = flat_world();
    world.add_character(100, Vector3::new(-20.0, 2.0, 0.0), 0.5, 2.0, tuning);
    settle(&mut world, 60);

    world.set_character_input(
        100,
        Vector3::new(1.0, 0.0, 0.0),
        false,
        Vector3::x(),
        Vector3::z(),
    );
    settle(&mut world, 240);

    let vel = world.get_character_velocity(100).unwrap();
    assert!(
        vel.x > 3.0 && vel.x < 4.5,
        "speed capped by config, got {vel:?}"
    );
}

#[test]
fn test_double_jump_requires_air_jump_credit() {
    let config: LocomotionConfig = toml::from_str("max_air_jumps = 1").unwrap();
    let tuning = config.tuning().unwrap();

    let mut world = flat_world();
    world.add_character(100, Vector3::new(0.0, 2.0, 0.0), 0.5, 2.0, tuning.clone());
    settle(&mut world, 120);

    world.request_character_jump(100);
    world.step(DT);
    let first = world.get_character_velocity(100).unwrap().y;
    assert!(first > 4.0, "first jump, got {first}");

    // Coast upward past the lift-off window, then jump again mid-air.
    settle(&mut world, 20);
    let before = world.get_character_velocity(100).unwrap().y;
    world.request_character_jump(100);
    world.step(DT);
    let after = world.get_character_velocity(100).unwrap().y;
    assert!(after > before, "air jump adds speed: {before} -> {after}");

    let state = world.character(100).unwrap();
    assert!(state.jump_phase() <= tuning.max_air_jumps + 1);

    // Credit spent: a third request mid-air changes nothing.
    settle(&mut world, 5);
    let before = world.get_character_velocity(100).unwrap().y;
    world.request_character_jump(100);
    world.step(DT);
    let after = world.get_character_velocity(100).unwrap().y;
    assert!(
        after <= before + 1e-3,
        "third jump must be dropped: {before} -> {after}"
    );
}

#[test]
fn test_stairs_are_walkable_where_plain_slope_is_not() {
    // The same 40° ramp twice: walkable only under the stairs category.
    let ramp_rotation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 40.0_f32.to_radians());

    let grounded_on = |surface: SurfaceCategory| -> bool {
        let mut world = PhysicsWorld::new();
        world.add_part(
            1,
            Vector3::zeros(),
            ramp_rotation,
            Vector3::new(10.0, 0.5, 10.0),
            true,
            surface,
        );
        world.add_character(
            100,
            Vector3::new(0.0, 4.0, 0.0),
            0.5,
            2.0,
            LocomotionConfig::default().tuning().unwrap(),
        );
        let mut grounded = false;
        for _ in 0..180 {
            world.step(DT);
            if world.character(100).unwrap().on_ground() {
                grounded = true;
            }
        }
        grounded
    };

    assert!(
        grounded_on(SurfaceCategory::Stairs),
        "40° stairs are within the 50° stair limit"
    );
    assert!(
        !grounded_on(SurfaceCategory::Ground),
        "40° plain slope exceeds the 25° ground limit"
    );
}

#[test]
fn test_platform_plus_input_velocities_add() {
    // Platform at 2 m/s, desired relative velocity 1 m/s: the absolute
    // velocity converges to about 3 m/s.
    let config: LocomotionConfig = toml::from_str("max_speed = 1.0").unwrap();
    let tuning = config.tuning().unwrap();

    let mut world = PhysicsWorld::new();
    let platform = world.add_part(
        1,
        Vector3::zeros(),
        UnitQuaternion::identity(),
        Vector3::new(12.0, 0.5, 12.0),
        true,
        SurfaceCategory::Ground,
    );
    world.add_character(100, Vector3::new(0.0, 2.0, 0.0), 0.5, 2.0, tuning);
    settle(&mut world, 120);

    world.set_character_input(
        100,
        Vector3::new(1.0, 0.0, 0.0),
        false,
        Vector3::x(),
        Vector3::z(),
    );
    let mut platform_x = 0.0_f32;
    for _ in 0..300 {
        platform_x += 2.0 * DT;
        world.set_kinematic_position(platform, Vector3::new(platform_x, 0.0, 0.0));
        world.step(DT);
    }

    let vel = world.get_character_velocity(100).unwrap();
    assert!(
        (vel.x - 3.0).abs() < 0.5,
        "platform velocity plus relative input, got {vel:?}"
    );
}

#[test]
fn test_characters_are_independent() {
    let mut world = flat_world();
    let tuning = LocomotionConfig::default().tuning().unwrap();
    world.add_character(100, Vector3::new(-5.0, 2.0, -5.0), 0.5, 2.0, tuning.clone());
    world.add_character(200, Vector3::new(5.0, 2.0, 5.0), 0.5, 2.0, tuning);
    settle(&mut world, 120);

    world.set_character_input(
        100,
        Vector3::new(1.0, 0.0, 0.0),
        false,
        Vector3::x(),
        Vector3::z(),
    );
    settle(&mut world, 180);

    let walker = world.get_character_velocity(100).unwrap();
    let idler = world.get_character_velocity(200).unwrap();
    assert!(walker.x > 5.0, "walker moves, got {walker:?}");
    assert!(idler.norm() < 0.5, "idler stays put, got {idler:?}");
    assert!(world.character(100).unwrap().on_ground());
    assert!(world.character(200).unwrap().on_ground());
}
