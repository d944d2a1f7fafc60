// Melee combat
//
// - Animator interface and layer fades
// - Weapon core: tap/hold classification, attack buffering, blocking
// - Sword weapon and the damage interface it hits through

pub mod animator;
pub mod damage;
pub mod sword;
pub mod weapon;

pub use animator::{AnimParam, AnimatorParams};
pub use damage::{Damageable, HitLog, WeaponHit};
pub use sword::{BladeContact, Sword};
pub use weapon::{AnimationEvent, AttackInput, Weapon};
