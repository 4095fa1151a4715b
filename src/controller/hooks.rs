use std::cell::RefCell;

use crate::model::SettingValue;

pub type Hook = Box<dyn FnMut()>;
pub type EventHook<E> = Box<dyn FnMut(&E)>;
pub type ChangeHook = Box<dyn FnMut(&str, &SettingValue)>;

/// User callbacks, one optional slot per lifecycle point.
/// `E` is the raw event handed to input hooks (`web_sys::Event` in the browser).
pub struct Hooks<E> {
    pub setup: Option<Hook>,
    pub frame: Option<Hook>,
    pub resize: Option<Hook>,
    pub reset: Option<Hook>,
    pub on_move: Option<EventHook<E>>,
    pub touch: Option<EventHook<E>>,
    pub release: Option<EventHook<E>>,
    pub accelerometer: Option<EventHook<E>>,
    pub change: Option<ChangeHook>,
}

impl<E> Default for Hooks<E> {
    fn default() -> Self {
        Self {
            setup: None,
            frame: None,
            resize: None,
            reset: None,
            on_move: None,
            touch: None,
            release: None,
            accelerometer: None,
            change: None,
        }
    }
}

/// Runs the hook in `slot` with the cell unborrowed, so the hook may call back
/// into whatever owns the cell. The hook goes back into its slot afterwards
/// unless it installed a replacement while running.
/// Returns false when the slot is empty.
pub fn invoke<E, H, S, F>(hooks: &RefCell<Hooks<E>>, slot: S, call: F) -> bool
where
    H: ?Sized,
    S: Fn(&mut Hooks<E>) -> &mut Option<Box<H>>,
    F: FnOnce(&mut H),
{
    let taken = slot(&mut hooks.borrow_mut()).take();
    let Some(mut hook) = taken else {
        return false;
    };
    call(&mut *hook);

    let mut hooks = hooks.borrow_mut();
    let target = slot(&mut hooks);
    if target.is_none() {
        *target = Some(hook);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_empty_slot_is_not_called() {
        let hooks: RefCell<Hooks<()>> = RefCell::new(Hooks::default());
        assert!(!invoke(&hooks, |h| &mut h.frame, |f| f()));
    }

    #[test]
    fn test_hook_can_reenter_the_cell() {
        let hooks: Rc<RefCell<Hooks<()>>> = Rc::new(RefCell::new(Hooks::default()));
        let calls = Rc::new(RefCell::new(0));

        let inner = hooks.clone();
        let counter = calls.clone();
        hooks.borrow_mut().frame = Some(Box::new(move || {
            *counter.borrow_mut() += 1;
            // borrowing while running must not panic
            assert!(inner.borrow().resize.is_none());
        }));

        assert!(invoke(&*hooks, |h| &mut h.frame, |f| f()));
        assert!(invoke(&*hooks, |h| &mut h.frame, |f| f()));
        assert_eq!(*calls.borrow(), 2);
        assert!(hooks.borrow().frame.is_some());
    }

    #[test]
    fn test_replacement_installed_while_running_wins() {
        let hooks: Rc<RefCell<Hooks<()>>> = Rc::new(RefCell::new(Hooks::default()));
        let log = Rc::new(RefCell::new(Vec::new()));

        let inner = hooks.clone();
        let first_log = log.clone();
        hooks.borrow_mut().frame = Some(Box::new(move || {
            first_log.borrow_mut().push("first");
            let second_log = first_log.clone();
            inner.borrow_mut().frame = Some(Box::new(move || second_log.borrow_mut().push("second")));
        }));

        invoke(&*hooks, |h| &mut h.frame, |f| f());
        invoke(&*hooks, |h| &mut h.frame, |f| f());
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_event_and_change_hooks_receive_arguments() {
        let hooks: RefCell<Hooks<i32>> = RefCell::new(Hooks::default());
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = seen.clone();
        hooks.borrow_mut().touch = Some(Box::new(move |e: &i32| s.borrow_mut().push(format!("touch {e}"))));
        let s = seen.clone();
        hooks.borrow_mut().change = Some(Box::new(move |name: &str, value: &SettingValue| {
            s.borrow_mut().push(format!("{name}={value}"))
        }));

        invoke(&hooks, |h| &mut h.touch, |f| f(&7));
        invoke(&hooks, |h| &mut h.change, |f| f("force", &SettingValue::Number(12.0)));
        assert_eq!(*seen.borrow(), vec!["touch 7", "force=12"]);
    }
}
