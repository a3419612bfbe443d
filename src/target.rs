use std::sync::{Arc, RwLock};

/// The player id or name currently typed in the input.
///
/// The UI thread writes it on every edit; refreshes read one whole value at
/// spawn time, so a check never sees a half-applied edit.
#[derive(Debug, Clone, Default)]
pub struct Target {
    value: Arc<RwLock<String>>,
}

impl Target {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            value: Arc::new(RwLock::new(initial.into())),
        }
    }

    pub fn set(&self, value: &str) {
        let mut guard = self.value.write().unwrap_or_else(|e| e.into_inner());
        guard.clear();
        guard.push_str(value);
    }

    pub fn snapshot(&self) -> String {
        self.value
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_is_detached_from_later_edits() {
        let target = Target::new("948713");
        let snap = target.snapshot();
        target.set("peppy");
        assert_eq!(snap, "948713");
        assert_eq!(target.snapshot(), "peppy");
    }

    #[test]
    fn clones_share_the_value() {
        let target = Target::new("a");
        let other = target.clone();
        other.set("b");
        assert_eq!(target.snapshot(), "b");
    }
}
