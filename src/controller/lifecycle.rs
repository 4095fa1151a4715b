/// Controller states after construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Ready,
    Running,
    Stopped,
}

impl Lifecycle {
    /// State after `start()`, or `None` when already running
    pub fn start(self) -> Option<Lifecycle> {
        match self {
            Lifecycle::Ready | Lifecycle::Stopped => Some(Lifecycle::Running),
            Lifecycle::Running => None,
        }
    }

    /// State after `stop()`, or `None` when there is nothing to stop
    pub fn stop(self) -> Option<Lifecycle> {
        match self {
            Lifecycle::Running => Some(Lifecycle::Stopped),
            Lifecycle::Ready | Lifecycle::Stopped => None,
        }
    }

    pub fn is_running(self) -> bool {
        self == Lifecycle::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        let running = Lifecycle::Ready.start().unwrap();
        assert!(running.is_running());
        assert_eq!(running.start(), None);

        let stopped = running.stop().unwrap();
        assert_eq!(stopped, Lifecycle::Stopped);
        assert_eq!(stopped.stop(), None);
        assert_eq!(stopped.start(), Some(Lifecycle::Running));
        assert_eq!(Lifecycle::Ready.stop(), None);
    }
}
