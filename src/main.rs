use std::time::Duration;

use anyhow::{Context, Result};
use glam::Vec2;
use log::info;

mod core;
mod engine;
mod game;

use engine::game_loop::GameLoop;
use engine::physics::{body::presets, PhysicsWorld};
use game::characters::Character;
use game::combat::{AnimParam, AnimationEvent, AttackInput, Damageable, HitLog, Sword, WeaponHit};
use game::rig::{AnimatedPose, Hit, HitReactionRig, PartId, RigConfig};

/// Length of the scripted scene in rendered frames
const SCENE_FRAMES: u32 = 240;

/// Frames the attack input is held for
const ATTACK_FRAMES: std::ops::Range<u32> = 20..40;

/// Scales a blade hit's force into a rig impulse
const BLADE_IMPULSE_SCALE: f32 = 0.01;

/// Weapon hits that also knock the struck part of a rig
struct RigTarget<'a> {
    rig: &'a mut HitReactionRig,
    part: PartId,
    log: &'a mut HitLog,
    mass: f32,
}

impl Damageable for RigTarget<'_> {
    fn damage_me(&mut self, hit: &WeaponHit) {
        self.log.damage_me(hit);
        self.rig.apply_hit(
            self.part,
            Hit {
                point: hit.point,
                normal: hit.force.normalize_or_zero(),
                impulse: hit.force * BLADE_IMPULSE_SCALE,
                mass: self.mass,
            },
        );
    }
}

/// Where the scripted swing animation is
#[derive(Debug, Default)]
struct SwingScript {
    frame: Option<u32>,
}

impl SwingScript {
    /// Animation events due this frame
    fn advance(&mut self) -> Option<AnimationEvent> {
        let frame = self.frame?;
        self.frame = Some(frame + 1);
        match frame {
            0 => Some(AnimationEvent::SwingFadeIn(0.1)),
            6 => Some(AnimationEvent::SwingStart),
            18 => Some(AnimationEvent::SwingEnd),
            20 => {
                self.frame = None;
                Some(AnimationEvent::SwingFadeOut(0.2))
            }
            _ => None,
        }
    }

    fn arm_raised(&self) -> bool {
        self.frame.is_some_and(|frame| (6..18).contains(&frame))
    }
}

fn load_rig() -> Result<RigConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading rig from {}", path);
            RigConfig::load(&path).with_context(|| format!("Failed to load rig '{}'", path))
        }
        None => Ok(RigConfig::humanoid()),
    }
}

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Starting Rusted Rig...");

    let config = load_rig()?;
    let mut physics = PhysicsWorld::new();
    let ground = physics.add_rigid_body(presets::ground_body(0.0, -0.5));
    physics.add_collider(presets::ground_collider(40.0, 1.0), ground);

    let mut hero = Character::spawn(0, "hero", &config, &mut physics, Vec2::ZERO)?;
    let mut dummy = Character::spawn(1, "dummy", &config, &mut physics, Vec2::new(0.9, 0.0))?;
    dummy.locomotion.flip();
    if !hero.equip(Sword::default(), "hand_r", &mut physics) {
        info!("Rig has no 'hand_r', the hero fights bare-handed");
    }

    // A ball thrown at the dummy's head from behind
    let ball = physics.add_rigid_body(presets::prop_body(Vec2::new(3.0, 1.9), Vec2::new(-6.0, 0.0)));
    physics.add_collider(presets::prop_collider(0.1, 4.0), ball);

    let torso_collider = dummy
        .rig
        .registry()
        .collider_id("torso")
        .and_then(|id| dummy.bodies().collider_handle(id));
    let torso_part = dummy.rig.registry().part_id("torso");

    let idle = AnimatedPose::new();
    let mut hero_pose = AnimatedPose::new();
    let mut swing = SwingScript::default();
    let mut hits = HitLog::new();
    let mut game_loop = GameLoop::new();
    let frame_time = Duration::from_secs_f32(game_loop.fixed_timestep());

    for frame in 0..SCENE_FRAMES {
        let ticks = game_loop.advance(frame_time);
        let dt = game_loop.frame_delta_time();

        let input = if ATTACK_FRAMES.contains(&frame) {
            AttackInput::new(1, 0)
        } else {
            AttackInput::default()
        };
        hero.frame_update(&hero_pose, &input, dt);
        dummy.frame_update(&idle, &AttackInput::default(), dt);

        if hero.animator.consume_trigger(AnimParam::SwingArmRight) {
            swing.frame = Some(0);
        }
        if let Some(event) = swing.advance() {
            hero.animation_event(event);
        }
        hero_pose.clear();
        if swing.arm_raised() {
            hero_pose.set_degrees("upper_arm_r", 0.0);
            hero_pose.set_degrees("lower_arm_r", 0.0);
            hero_pose.set_degrees("hand_r", 0.0);
        }

        let tick_dt = game_loop.fixed_timestep();
        for _ in 0..ticks {
            hero.physics_tick(&hero_pose, &mut physics, tick_dt);
            dummy.physics_tick(&idle, &mut physics, tick_dt);
            physics.step();
            hero.collect_contacts(&physics, tick_dt);
            dummy.collect_contacts(&physics, tick_dt);
            dummy.update_grounded(&physics);

            if let (Some(collider), Some(part)) = (torso_collider, torso_part) {
                let mut target = RigTarget {
                    rig: &mut dummy.rig,
                    part,
                    log: &mut hits,
                    mass: hero.weapon().map_or(1.0, |sword| sword.config().mass),
                };
                hero.strike(&physics, collider, &mut target);
            }
        }

        if frame % 20 == 0 {
            let torque = dummy.rig.part("head").map_or(0.0, |head| head.torque());
            info!(
                "Frame {:3}: dummy head torque {:+.3}, settled {}, grounded {}",
                frame,
                torque,
                dummy.rig.is_settled(),
                dummy.locomotion.grounded
            );
        }
    }

    info!(
        "Scene over after {} ticks: {} sword hits for {} damage",
        game_loop.tick_count(),
        hits.hits().len(),
        hits.total_damage()
    );

    Ok(())
}
