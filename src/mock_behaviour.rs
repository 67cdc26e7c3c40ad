//! This module provides ways to tweak mocked storages and notifiers, so that they can return errors on some tests

/// This stores some behaviour tweaks, that describe how a mocked instance will behave during a given test
///
/// So that a functions fails _n_ times after _m_ initial successes, set `(m, n)` for the suited parameter
#[derive(Default, Clone, Debug)]
pub struct MockBehaviour {
    /// If this is true, every action will be allowed
    pub is_suspended: bool,

    // From the KeyValueStorage trait
    pub get_item_behaviour: (u32, u32),
    pub set_item_behaviour: (u32, u32),
    pub remove_item_behaviour: (u32, u32),

    // From the NotificationService trait
    pub permission_behaviour: (u32, u32),
    pub schedule_behaviour: (u32, u32),
    pub cancel_behaviour: (u32, u32),
}

impl MockBehaviour {
    pub fn new() -> Self {
        Self::default()
    }

    /// All items will fail at once, for `n_fails` times
    pub fn fail_now(n_fails: u32) -> Self {
        Self {
            is_suspended: false,
            get_item_behaviour: (0, n_fails),
            set_item_behaviour: (0, n_fails),
            remove_item_behaviour: (0, n_fails),
            permission_behaviour: (0, n_fails),
            schedule_behaviour: (0, n_fails),
            cancel_behaviour: (0, n_fails),
        }
    }

    /// Suspend this mock behaviour until you call `resume`
    pub fn suspend(&mut self) {
        self.is_suspended = true;
    }
    /// Make this behaviour active again
    pub fn resume(&mut self) {
        self.is_suspended = false;
    }

    pub fn can_get_item(&mut self) -> Result<(), String> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.get_item_behaviour, "get_item")
    }
    pub fn can_set_item(&mut self) -> Result<(), String> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.set_item_behaviour, "set_item")
    }
    pub fn can_remove_item(&mut self) -> Result<(), String> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.remove_item_behaviour, "remove_item")
    }
    pub fn can_query_permission(&mut self) -> Result<(), String> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.permission_behaviour, "permission query")
    }
    pub fn can_schedule(&mut self) -> Result<(), String> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.schedule_behaviour, "schedule")
    }
    pub fn can_cancel(&mut self) -> Result<(), String> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.cancel_behaviour, "cancel")
    }
}


/// Return Ok(()) in case the value is `(1+, _)` or `(_, 0)`, or return Err and decrement otherwise
fn decrement(value: &mut (u32, u32), descr: &str) -> Result<(), String> {
    let remaining_successes = value.0;
    let remaining_failures = value.1;

    if remaining_successes > 0 {
        value.0 = value.0 - 1;
        log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
        Ok(())
    } else {
        if remaining_failures > 0 {
            value.1 = value.1 - 1;
            log::debug!("Mock behaviour: failing a {} ({:?})", descr, value);
            Err(format!("Mocked behaviour requires this {} to fail this time. ({:?})", descr, value))
        } else {
            log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
            Ok(())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mock_behaviour() {
        let mut ok = MockBehaviour::new();
        assert!(ok.can_get_item().is_ok());
        assert!(ok.can_set_item().is_ok());
        assert!(ok.can_schedule().is_ok());

        let mut now = MockBehaviour::fail_now(2);
        assert!(now.can_set_item().is_err());
        assert!(now.can_schedule().is_err());
        assert!(now.can_schedule().is_err());
        assert!(now.can_set_item().is_err());
        assert!(now.can_set_item().is_ok());
        assert!(now.can_set_item().is_ok());
        assert!(now.can_schedule().is_ok());

        let mut custom = MockBehaviour{
            get_item_behaviour: (0,1),
            set_item_behaviour: (1,3),
            ..MockBehaviour::default()
        };
        assert!(custom.can_get_item().is_err());
        assert!(custom.can_get_item().is_ok());
        assert!(custom.can_get_item().is_ok());
        assert!(custom.can_set_item().is_ok());
        assert!(custom.can_set_item().is_err());
        assert!(custom.can_set_item().is_err());
        assert!(custom.can_set_item().is_err());
        assert!(custom.can_set_item().is_ok());

        custom.set_item_behaviour = (0, 1);
        custom.suspend();
        assert!(custom.can_set_item().is_ok());
        custom.resume();
        assert!(custom.can_set_item().is_err());
    }
}
