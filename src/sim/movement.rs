//! Player movement state machine
//!
//! Each tick the controller reads the contact sides, picks at most one
//! contact-driven transition, applies the rules of the resulting state, then
//! the shared physics (gravity, friction, drag). A jump rule may schedule a
//! second transition that lands at the end of the tick.

use glam::{DVec2, IVec2};
use serde::{Deserialize, Serialize};

use super::collision::ContactSide;
use super::contact::ContactLedger;
use crate::axis_sign;
use crate::tuning::Tuning;

/// Discrete movement states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MovementState {
    Ground,
    Wall,
    /// Rising from a ground or wall jump; held input extends the jump
    GroundJump,
    /// Airborne with the double jump still available
    Jump1,
    /// Rising from a double jump
    AirJump,
    /// Airborne with no jumps left
    #[default]
    Falling,
    WallJump,
}

impl MovementState {
    pub fn is_airborne(self) -> bool {
        !matches!(self, MovementState::Ground | MovementState::Wall)
    }
}

/// One tick of intent for a controlled entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InputState {
    /// Horizontal intent: -1, 0 or 1
    pub x: i8,
    /// Vertical intent: -1 (down/crouch), 0, or 1 (up/jump)
    pub y: i8,
    /// Action trigger (fire)
    pub action: bool,
    /// Raw pointer position in screen pixels
    pub pointer: IVec2,
    pub mouse_down: bool,
    pub right_mouse_down: bool,
}

/// Movement state plus the input history needed for edge detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerController {
    pub prev_state: MovementState,
    pub state: MovementState,
    pub inp: InputState,
    pub prev_inp: InputState,
    /// Touched sides from the last contact check, indexed by `ContactSide::index`
    pub contact_sides: [bool; 4],
    /// Ticks spent in the current state
    pub timestep: u32,
    /// Last non-zero horizontal input (+1 or -1)
    pub facing: i8,
}

impl Default for PlayerController {
    fn default() -> Self {
        Self {
            prev_state: MovementState::Falling,
            state: MovementState::Falling,
            inp: InputState::default(),
            prev_inp: InputState::default(),
            contact_sides: [false; 4],
            timestep: 0,
            facing: 1,
        }
    }
}

impl PlayerController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shift the current input into history and store the new one
    pub fn update_inputs(&mut self, new_inp: InputState) {
        self.prev_inp = self.inp;
        self.inp = new_inp;
        if new_inp.x != 0 {
            self.facing = new_inp.x.signum();
        }
    }

    /// Up was pressed this tick and not the previous one
    pub fn jump_pressed(&self) -> bool {
        self.inp.y > 0 && self.prev_inp.y <= 0
    }

    /// Action went from released to held this tick
    pub fn action_pressed(&self) -> bool {
        self.inp.action && !self.prev_inp.action
    }

    fn touching(&self, side: ContactSide) -> bool {
        self.contact_sides[side.index()]
    }

    fn touching_wall(&self) -> bool {
        self.touching(ContactSide::Left) || self.touching(ContactSide::Right)
    }

    /// Refresh the side flags and take the contact-driven transition, if any
    pub fn apply_contacts(&mut self, vel: DVec2, contacts: &ContactLedger, tuning: &Tuning) {
        self.contact_sides = contacts.sides();
        let on_ground = self.touching(ContactSide::Top);
        let on_wall = self.touching_wall();

        let next = match self.state {
            MovementState::Ground if !on_ground && on_wall => MovementState::Wall,
            MovementState::Ground if !on_ground => MovementState::Jump1,
            MovementState::Wall if on_ground => MovementState::Ground,
            MovementState::Wall if !on_wall => MovementState::GroundJump,
            MovementState::Ground | MovementState::Wall => self.state,
            _ if on_ground => MovementState::Ground,
            _ if on_wall && vel.y.abs() <= tuning.wall_grab_max_speed => MovementState::Wall,
            _ => self.state,
        };
        self.switch_to(next);
    }

    fn switch_to(&mut self, next: MovementState) {
        if next != self.state {
            log::debug!("movement {:?} -> {:?} after {} ticks", self.state, next, self.timestep);
            self.state = next;
            self.timestep = 0;
        }
    }

    /// Run one tick of the state machine and return the new velocity
    pub fn apply_controls(&mut self, mut v: DVec2, contacts: &ContactLedger, tuning: &Tuning) -> DVec2 {
        self.prev_state = self.state;
        self.apply_contacts(v, contacts, tuning);

        let mut next_state = self.state;
        let dir = axis_sign(self.inp.x);
        // A RIGHT contact means the wall is on the left, so jumps push +x
        let wall_on_left = self.touching(ContactSide::Right);

        match self.state {
            MovementState::Ground => {
                v.x += dir * tuning.ground_acc;
                if self.inp.y < 0 {
                    v.x *= tuning.crouch_damping;
                } else if self.inp.y > 0 {
                    v.y += tuning.ground_jump_vel;
                    next_state = MovementState::GroundJump;
                }
            }
            MovementState::Wall => {
                let into_wall = (wall_on_left && self.inp.x < 0) || (!wall_on_left && self.inp.x > 0);
                if into_wall {
                    v.y *= tuning.wall_stick_damping;
                }
                v.x += dir * tuning.ground_acc;
                if self.jump_pressed() {
                    let [push, lift] = tuning.wall_jump_vel;
                    v.y += lift;
                    v.x += if wall_on_left { push } else { -push };
                    next_state = MovementState::GroundJump;
                }
            }
            MovementState::GroundJump => {
                v.x += dir * tuning.jump_control_acc;
                if self.timestep < tuning.jump_boost_ticks && self.inp.y > 0 {
                    v.y += tuning.ground_jump_boost;
                } else {
                    next_state = MovementState::Jump1;
                }
            }
            MovementState::Jump1 => {
                v.x += dir * tuning.air_acc;
                if self.inp.y < 0 {
                    v.y -= tuning.fast_fall_acc;
                }
                if self.jump_pressed() {
                    v.y += tuning.air_jump_vel;
                    next_state = MovementState::AirJump;
                }
            }
            MovementState::AirJump => {
                v.x += dir * tuning.jump_control_acc;
                if self.timestep < tuning.jump_boost_ticks && self.inp.y > 0 {
                    v.y += tuning.air_jump_boost;
                } else {
                    next_state = MovementState::Falling;
                }
            }
            MovementState::Falling => {
                v.x += dir * tuning.air_acc;
                if self.inp.y < 0 {
                    v.y -= tuning.fast_fall_acc;
                }
            }
            MovementState::WallJump => {}
        }

        v = self.apply_physics(v, tuning);

        self.timestep += 1;
        self.switch_to(next_state);
        v
    }

    fn apply_physics(&self, mut v: DVec2, tuning: &Tuning) -> DVec2 {
        v.y -= tuning.gravity;
        if self.touching(ContactSide::Top) {
            v.x *= tuning.ground_friction;
        } else {
            v /= 1.0 + tuning.air_drag * v.length();
        }
        if self.touching_wall() {
            v.y *= tuning.wall_friction;
        }
        v
    }

    /// `(from, to)` if the last `apply_controls` changed state
    pub fn transition(&self) -> Option<(MovementState, MovementState)> {
        (self.prev_state != self.state).then_some((self.prev_state, self.state))
    }
}
