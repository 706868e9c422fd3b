//! # Mount Points
//!
//! The container a view exclusively owns. It is injected at construction
//! and cleared on destroy.

use std::collections::BTreeMap;

use parking_lot::Mutex;

/// UI container capability.
pub trait MountPoint: Send + Sync {
    /// Replaces the rendered content.
    fn set_content(&self, content: &str);

    /// Current rendered content.
    fn content(&self) -> String;

    /// Removes all content and field annotations.
    fn clear(&self);

    /// Sets (`Some`) or removes (`None`) the error annotation of a form field.
    fn set_field_error(&self, field: &str, error: Option<&str>);
}

#[derive(Debug, Default)]
struct MountState {
    content: String,
    field_errors: BTreeMap<String, String>,
    clear_count: usize,
}

/// Mount point held in memory. The console host prints its content.
#[derive(Debug, Default)]
pub struct MemoryMount {
    state: Mutex<MountState>,
}

impl MemoryMount {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field annotations currently shown.
    pub fn field_errors(&self) -> BTreeMap<String, String> {
        self.state.lock().field_errors.clone()
    }

    /// How many times the mount has been cleared.
    pub fn clear_count(&self) -> usize {
        self.state.lock().clear_count
    }
}

impl MountPoint for MemoryMount {
    fn set_content(&self, content: &str) {
        self.state.lock().content = content.to_string();
    }

    fn content(&self) -> String {
        self.state.lock().content.clone()
    }

    fn clear(&self) {
        let mut state = self.state.lock();
        state.content.clear();
        state.field_errors.clear();
        state.clear_count += 1;
    }

    fn set_field_error(&self, field: &str, error: Option<&str>) {
        let mut state = self.state.lock();
        match error {
            Some(error) => {
                state.field_errors.insert(field.to_string(), error.to_string());
            }
            None => {
                state.field_errors.remove(field);
            }
        }
    }
}
