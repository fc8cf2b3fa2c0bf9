//! Per-frame pointer input driving the force injection step.

use glam::Vec3;

/// A pick on the domain, in world space with the domain centred at the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pointer {
    pub position: Vec3,
    /// Drag direction.
    pub direction: Vec3,
}

impl Pointer {
    /// Position measured from the domain corner and direction in the same
    /// frame. World `z` points out of the screen while the grid's `z` runs
    /// into it, so `z` is mirrored.
    pub fn to_domain(&self, domain: Vec3) -> (Vec3, Vec3) {
        let centred = self.position + domain * 0.5;
        let position = Vec3::new(centred.x, centred.y, domain.z - centred.z);
        let direction = self.direction * Vec3::new(1.0, 1.0, -1.0);
        (position, direction)
    }
}

/// Interaction buttons held this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Buttons {
    /// Injects density.
    pub primary: bool,
    /// Injects velocity along the drag direction.
    pub secondary: bool,
}

impl Buttons {
    pub fn any(&self) -> bool {
        self.primary || self.secondary
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Interaction {
    /// `None` when the pointer misses the domain.
    pub pointer: Option<Pointer>,
    pub buttons: Buttons,
}

impl Interaction {
    /// No input this frame.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn density(position: Vec3) -> Self {
        Self {
            pointer: Some(Pointer {
                position,
                direction: Vec3::ZERO,
            }),
            buttons: Buttons {
                primary: true,
                secondary: false,
            },
        }
    }

    pub fn velocity(position: Vec3, direction: Vec3) -> Self {
        Self {
            pointer: Some(Pointer {
                position,
                direction,
            }),
            buttons: Buttons {
                primary: false,
                secondary: true,
            },
        }
    }

    /// The pointer, if it hits the domain while a button is held.
    pub fn active_pointer(&self) -> Option<&Pointer> {
        self.pointer.as_ref().filter(|_| self.buttons.any())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_to_domain_mirrors_z() {
        let pointer = Pointer {
            position: Vec3::new(-10.0, 0.0, 5.0),
            direction: Vec3::new(1.0, 2.0, 3.0),
        };
        let (position, direction) = pointer.to_domain(Vec3::new(20.0, 20.0, 20.0));
        assert_eq!(position, Vec3::new(0.0, 10.0, 5.0));
        assert_eq!(direction, Vec3::new(1.0, 2.0, -3.0));
    }

    #[test]
    fn test_active_pointer_needs_button_and_hit() {
        assert!(Interaction::none().active_pointer().is_none());
        assert!(Interaction::density(Vec3::ZERO).active_pointer().is_some());

        let missed = Interaction {
            pointer: None,
            buttons: Buttons {
                primary: true,
                secondary: true,
            },
        };
        assert!(missed.active_pointer().is_none());
    }
}
