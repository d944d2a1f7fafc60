// Shared melee attack machinery
//
// Attack input is classified as a tap or a hold, attacks started during
// another attack are buffered, and a held block keeps the character turned
// toward the attack until the input changes. Everything is advanced by
// `WeaponCore::update` once per frame.

use log::{debug, trace};

use super::animator::{AnimParam, Animator, FadeDirection, LayerFade, UPPER_BODY_LAYER};
use crate::game::characters::Locomotion;

/// How long attack input must be held to count as a hold (seconds)
pub const TAP_THRESHOLD: f32 = 0.1;

/// How long a buffered attack stays valid (seconds)
pub const BUFFER_TIME: f32 = 0.3;

/// Layer fade used when a held block starts and ends (seconds)
pub const BLOCK_FADE_TIME: f32 = 0.15;

/// Attack controls sampled this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttackInput {
    /// -1, 0 or 1
    pub horizontal: i8,
    /// -1, 0 or 1
    pub vertical: i8,
    pub block_pressed: bool,
}

impl AttackInput {
    pub fn new(horizontal: i8, vertical: i8) -> Self {
        Self {
            horizontal,
            vertical,
            block_pressed: false,
        }
    }

    pub fn with_block(mut self) -> Self {
        self.block_pressed = true;
        self
    }

    pub fn direction(&self) -> [i8; 2] {
        [self.horizontal, self.vertical]
    }

    pub fn is_neutral(&self) -> bool {
        self.horizontal == 0 && self.vertical == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackKind {
    Tap,
    Hold,
}

/// A resolved attack the weapon should perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackCommand {
    pub kind: AttackKind,
    /// Direction when the attack input began
    pub init_direction: [i8; 2],
    /// Direction at the moment it resolved
    pub direction: [i8; 2],
}

/// Events raised by attack animations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimationEvent {
    /// Fade the upper-body layer in over the given seconds
    SwingFadeIn(f32),
    SwingStart,
    SwingEnd,
    /// Fade the upper-body layer out and finish the attack
    SwingFadeOut(f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    /// Waiting to learn whether the input is a tap or a hold
    Charging,
    /// Buffered attack resolved, waiting for the current attack to end
    Queued(AttackKind),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingAttack {
    init_direction: [i8; 2],
    started: f32,
    buffered: bool,
    stage: Stage,
}

impl PendingAttack {
    fn new(input: &AttackInput, now: f32, buffered: bool) -> Self {
        Self {
            init_direction: input.direction(),
            started: now,
            buffered,
            stage: Stage::Charging,
        }
    }
}

/// Transient attack state shared by every melee weapon
#[derive(Debug, Clone, Default)]
pub struct WeaponCore {
    time: f32,
    equipped: bool,
    attacking: bool,
    swinging: bool,
    blocking: bool,
    old_direction: [i8; 2],
    attack_start: f32,
    buffer_attack_start: f32,
    pending: Option<PendingAttack>,
    buffered: Option<PendingAttack>,
    /// Initial direction of a held block still waiting for release
    hold_block: Option<[i8; 2]>,
    fade: Option<LayerFade>,
}

impl WeaponCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_equipped(&self) -> bool {
        self.equipped
    }

    /// An attack has started (not necessarily swinging yet)
    pub fn is_attacking(&self) -> bool {
        self.attacking
    }

    pub fn is_swinging(&self) -> bool {
        self.swinging
    }

    pub fn is_blocking(&self) -> bool {
        self.blocking
    }

    pub fn has_buffered_attack(&self) -> bool {
        self.buffered.is_some()
    }

    pub fn active_fade(&self) -> Option<&LayerFade> {
        self.fade.as_ref()
    }

    pub fn equip(&mut self) {
        self.reset();
        self.equipped = true;
    }

    pub fn unequip(&mut self) {
        self.reset();
        self.equipped = false;
    }

    fn reset(&mut self) {
        *self = Self {
            time: self.time,
            ..Self::default()
        };
    }

    /// Advance one frame. Returns an attack the weapon must perform, if one
    /// resolved this frame without turning into a block.
    pub fn update(
        &mut self,
        input: &AttackInput,
        dt: f32,
        animator: &mut dyn Animator,
        mvmt: &mut Locomotion,
    ) -> Option<AttackCommand> {
        self.time += dt;
        let now = self.time;

        if let Some(fade) = self.fade.as_mut() {
            fade.apply(animator, dt);
            if fade.is_finished() {
                self.fade = None;
            }
        }

        // Advance attacks started on earlier frames first
        let mut command = self.advance_pending(input, animator, mvmt);
        if command.is_none() {
            command = self.advance_buffered(input, animator, mvmt);
        }
        self.advance_hold_block(input, animator, mvmt);

        let direction = input.direction();
        let new_input = (input.horizontal != 0 && input.horizontal != self.old_direction[0])
            || (input.vertical != 0 && input.vertical != self.old_direction[1]);
        if new_input {
            if !self.attacking {
                self.attacking = true;
                self.attack_start = now;
                self.pending = Some(PendingAttack::new(input, now, false));
                debug!("Attack input {:?} started", direction);
            } else if self.old_direction == [0, 0] || now - self.attack_start > TAP_THRESHOLD * 2.0 {
                // An entirely new input, not the second key of a diagonal
                self.buffer_attack_start = now;
                self.buffered = Some(PendingAttack::new(input, now, true));
                debug!("Attack input {:?} buffered", direction);
            }
        }
        self.old_direction = direction;

        command
    }

    fn advance_pending(
        &mut self,
        input: &AttackInput,
        animator: &mut dyn Animator,
        mvmt: &mut Locomotion,
    ) -> Option<AttackCommand> {
        let pending = self.pending?;
        let kind = classify(&pending, input, self.time)?;
        self.pending = None;
        self.resolve(pending, kind, input, animator, mvmt)
    }

    fn advance_buffered(
        &mut self,
        input: &AttackInput,
        animator: &mut dyn Animator,
        mvmt: &mut Locomotion,
    ) -> Option<AttackCommand> {
        let mut buffered = self.buffered?;
        if buffered.stage == Stage::Charging {
            let kind = classify(&buffered, input, self.time)?;
            buffered.stage = Stage::Queued(kind);
            self.buffered = Some(buffered);
        }
        let Stage::Queued(kind) = buffered.stage else {
            return None;
        };
        if self.attacking {
            return None;
        }

        self.buffered = None;
        if self.time - self.buffer_attack_start >= BUFFER_TIME {
            debug!("Buffered attack expired");
            return None;
        }
        self.buffer_attack_start = 0.0;
        self.resolve(buffered, kind, input, animator, mvmt)
    }

    fn resolve(
        &mut self,
        pending: PendingAttack,
        kind: AttackKind,
        input: &AttackInput,
        animator: &mut dyn Animator,
        mvmt: &mut Locomotion,
    ) -> Option<AttackCommand> {
        self.attacking = true;
        if pending.buffered {
            self.attack_start = self.time;
        }

        if input.block_pressed {
            match kind {
                AttackKind::Tap => self.tap_block(pending.init_direction, animator, mvmt),
                AttackKind::Hold => self.hold_block(pending.init_direction, animator, mvmt),
            }
            return None;
        }

        mvmt.lock_flip();
        trace!("{:?} attack takes flip lock ({})", kind, mvmt.flip_locks());
        Some(AttackCommand {
            kind,
            init_direction: pending.init_direction,
            direction: input.direction(),
        })
    }

    fn face_attack(init_direction: [i8; 2], mvmt: &mut Locomotion) {
        if init_direction[0] != 0 && mvmt.flip_int() != init_direction[0] {
            mvmt.flip();
        }
    }

    fn tap_block(&mut self, init_direction: [i8; 2], animator: &mut dyn Animator, mvmt: &mut Locomotion) {
        Self::face_attack(init_direction, mvmt);
        animator.set_bool(AnimParam::MeleeBlocking, true);
        animator.set_trigger(AnimParam::TapBlockForward);
        mvmt.lock_flip();
        self.blocking = true;
    }

    fn hold_block(&mut self, init_direction: [i8; 2], animator: &mut dyn Animator, mvmt: &mut Locomotion) {
        Self::face_attack(init_direction, mvmt);
        self.fade_attack_in(BLOCK_FADE_TIME, animator);
        animator.set_bool(AnimParam::HoldBlockForward, true);
        animator.set_bool(AnimParam::MeleeBlocking, true);
        mvmt.lock_flip();
        self.blocking = true;
        self.hold_block = Some(init_direction);
    }

    fn advance_hold_block(&mut self, input: &AttackInput, animator: &mut dyn Animator, mvmt: &mut Locomotion) {
        let Some(init_direction) = self.hold_block else {
            return;
        };
        if input.direction() == init_direction {
            return;
        }
        self.hold_block = None;
        animator.set_bool(AnimParam::HoldBlockForward, false);
        animator.set_bool(AnimParam::MeleeBlocking, false);
        self.fade_attack_out(BLOCK_FADE_TIME, animator, mvmt);
    }

    /// React to an event raised by the attack animation
    pub fn handle_event(&mut self, event: AnimationEvent, animator: &mut dyn Animator, mvmt: &mut Locomotion) {
        match event {
            AnimationEvent::SwingFadeIn(duration) => self.fade_attack_in(duration, animator),
            AnimationEvent::SwingStart => self.swinging = true,
            AnimationEvent::SwingEnd => self.swinging = false,
            AnimationEvent::SwingFadeOut(duration) => self.fade_attack_out(duration, animator, mvmt),
        }
    }

    fn fade_attack_in(&mut self, duration: f32, animator: &mut dyn Animator) {
        let start = animator.layer_weight(UPPER_BODY_LAYER);
        self.fade = Some(LayerFade::new(UPPER_BODY_LAYER, FadeDirection::In, start, duration));
    }

    fn fade_attack_out(&mut self, duration: f32, animator: &mut dyn Animator, mvmt: &mut Locomotion) {
        if !self.attacking {
            return;
        }
        let start = animator.layer_weight(UPPER_BODY_LAYER);
        self.fade = Some(LayerFade::new(UPPER_BODY_LAYER, FadeDirection::Out, start, duration));
        mvmt.unlock_flip();
        animator.set_bool(AnimParam::MeleeBlocking, false);
        self.attacking = false;
        self.blocking = false;
    }
}

/// Tap once the input is released, hold once it outlasts the tap threshold
fn classify(pending: &PendingAttack, input: &AttackInput, now: f32) -> Option<AttackKind> {
    if now <= pending.started {
        return None;
    }
    if input.is_neutral() {
        Some(AttackKind::Tap)
    } else if now >= pending.started + TAP_THRESHOLD {
        Some(AttackKind::Hold)
    } else {
        None
    }
}

/// A melee weapon built on [`WeaponCore`]
pub trait Weapon {
    fn core(&self) -> &WeaponCore;
    fn core_mut(&mut self) -> &mut WeaponCore;

    /// Perform a quick attack
    fn attack_tap(&mut self, command: &AttackCommand, animator: &mut dyn Animator);

    /// Perform a charged attack
    fn attack_hold(&mut self, command: &AttackCommand, animator: &mut dyn Animator);

    /// Per-frame input handling
    fn update(&mut self, input: &AttackInput, dt: f32, animator: &mut dyn Animator, mvmt: &mut Locomotion) {
        if let Some(command) = self.core_mut().update(input, dt, animator, mvmt) {
            match command.kind {
                AttackKind::Tap => self.attack_tap(&command, animator),
                AttackKind::Hold => self.attack_hold(&command, animator),
            }
        }
    }

    fn receive_animation_event(&mut self, event: AnimationEvent, animator: &mut dyn Animator, mvmt: &mut Locomotion) {
        self.core_mut().handle_event(event, animator, mvmt);
    }

    fn on_equip(&mut self) {
        self.core_mut().equip();
    }

    fn on_unequip(&mut self) {
        self.core_mut().unequip();
    }

    /// Unequip and forget the holder
    fn on_drop(&mut self) {
        self.on_unequip();
    }
}
