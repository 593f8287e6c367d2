//! Idle/hover/click visual state of an interactive plane.

use htmlmesh_core::PointerTrigger;

/// Visual state a plane shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlaneVisualState {
    /// Pointer is elsewhere.
    #[default]
    Idle,
    /// Pointer is over the plane.
    Hover,
    /// Pointer is pressed on the plane.
    Click,
}

/// Triggers that swap the plane texture, in registration order.
pub const TEXTURE_SWAP_TRIGGERS: [PointerTrigger; 4] = [
    PointerTrigger::PointerOver,
    PointerTrigger::PointerOut,
    PointerTrigger::PickDown,
    PointerTrigger::PickUp,
];

impl PlaneVisualState {
    /// State entered when `trigger` fires, or `None` if it swaps nothing.
    ///
    /// Depends only on the trigger: out-of-order sequences such as a press
    /// without a prior enter are not rejected.
    pub fn after(trigger: PointerTrigger) -> Option<PlaneVisualState> {
        match trigger {
            PointerTrigger::PointerOver => Some(PlaneVisualState::Hover),
            PointerTrigger::PointerOut => Some(PlaneVisualState::Idle),
            PointerTrigger::PickDown => Some(PlaneVisualState::Click),
            // Release returns to hover, not idle.
            PointerTrigger::PickUp => Some(PlaneVisualState::Hover),
            PointerTrigger::Pick => None,
        }
    }

    /// Apply `trigger` to the current state.
    pub fn next(self, trigger: PointerTrigger) -> PlaneVisualState {
        Self::after(trigger).unwrap_or(self)
    }
}

/// One value per visual state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTextures<T> {
    /// Idle value.
    pub idle: T,
    /// Hover value.
    pub hover: T,
    /// Click value.
    pub click: T,
}

impl<T> StateTextures<T> {
    /// Value for `state`.
    pub fn for_state(&self, state: PlaneVisualState) -> &T {
        match state {
            PlaneVisualState::Idle => &self.idle,
            PlaneVisualState::Hover => &self.hover,
            PlaneVisualState::Click => &self.click,
        }
    }

    /// Values in idle, hover, click order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        [&self.idle, &self.hover, &self.click].into_iter()
    }

    /// Transform each value, idle first.
    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> StateTextures<U> {
        StateTextures {
            idle: f(&self.idle),
            hover: f(&self.hover),
            click: f(&self.click),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_cycle_returns_through_hover() {
        let mut state = PlaneVisualState::default();
        let mut seen = vec![state];
        for trigger in [
            PointerTrigger::PointerOver,
            PointerTrigger::PickDown,
            PointerTrigger::PickUp,
            PointerTrigger::PointerOut,
        ] {
            state = state.next(trigger);
            seen.push(state);
        }
        assert_eq!(
            seen,
            vec![
                PlaneVisualState::Idle,
                PlaneVisualState::Hover,
                PlaneVisualState::Click,
                PlaneVisualState::Hover,
                PlaneVisualState::Idle,
            ]
        );
    }

    #[test]
    fn pick_keeps_current_state() {
        assert_eq!(
            PlaneVisualState::Hover.next(PointerTrigger::Pick),
            PlaneVisualState::Hover
        );
    }

    #[test]
    fn malformed_sequences_pass_through() {
        // Press without enter still shows the click texture.
        assert_eq!(
            PlaneVisualState::Idle.next(PointerTrigger::PickDown),
            PlaneVisualState::Click
        );
    }

    #[test]
    fn map_preserves_slots() {
        let values = StateTextures {
            idle: 1,
            hover: 2,
            click: 3,
        };
        let doubled = values.map(|v| v * 2);
        assert_eq!(*doubled.for_state(PlaneVisualState::Idle), 2);
        assert_eq!(*doubled.for_state(PlaneVisualState::Hover), 4);
        assert_eq!(*doubled.for_state(PlaneVisualState::Click), 6);
        assert_eq!(doubled.iter().copied().collect::<Vec<_>>(), vec![2, 4, 6]);
    }
}
