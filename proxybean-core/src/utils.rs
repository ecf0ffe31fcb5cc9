//! Utility functions for the container

/// Naming convention utilities for bean names
pub mod naming {
    /// Derives the default bean name from a simple type name.
    ///
    /// The first character is lower-cased, except when the first two characters
    /// are both upper case, in which case the name is kept as is, so acronyms
    /// such as `URLStore` keep their spelling.
    ///
    /// # Examples
    ///
    /// ```
    /// use proxybean_core::utils::naming::decapitalize;
    ///
    /// assert_eq!(decapitalize("UserRepository"), "userRepository");
    /// assert_eq!(decapitalize("URLStore"), "URLStore");
    /// assert_eq!(decapitalize("A"), "a");
    /// assert_eq!(decapitalize(""), "");
    /// ```
    pub fn decapitalize(s: &str) -> String {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (None, _) => String::new(),
            (Some(first), Some(second)) if first.is_uppercase() && second.is_uppercase() => {
                s.to_string()
            }
            (Some(first), _) => {
                let mut result = String::with_capacity(s.len());
                result.extend(first.to_lowercase());
                result.push_str(&s[first.len_utf8()..]);
                result
            }
        }
    }

    /// Returns the last path segment of a qualified Rust type name.
    ///
    /// ```
    /// use proxybean_core::utils::naming::simple_type_name;
    ///
    /// assert_eq!(simple_type_name("app::repo::UserRepository"), "UserRepository");
    /// assert_eq!(simple_type_name("UserRepository"), "UserRepository");
    /// ```
    pub fn simple_type_name(type_name: &str) -> &str {
        type_name
            .rsplit_once("::")
            .map(|(_, simple)| simple)
            .unwrap_or(type_name)
    }

    /// Qualified name of a trait-object type, without the `dyn` keyword and
    /// auto-trait bounds. Matches the name `#[proxy_bean]` records for the trait.
    ///
    /// ```
    /// use proxybean_core::utils::naming::interface_type_name;
    ///
    /// trait Repository {}
    ///
    /// assert!(interface_type_name::<dyn Repository + Send>().ends_with("::Repository"));
    /// assert_eq!(interface_type_name::<String>(), "alloc::string::String");
    /// ```
    pub fn interface_type_name<T: ?Sized>() -> String {
        let name = std::any::type_name::<T>();
        let name = name.strip_prefix("dyn ").unwrap_or(name);
        name.split(" + ").next().unwrap_or(name).to_string()
    }

    /// Returns the module path that declares a qualified type name, or an
    /// empty string for an unqualified name.
    pub fn package_of(type_name: &str) -> &str {
        type_name
            .rsplit_once("::")
            .map(|(package, _)| package)
            .unwrap_or("")
    }
}

/// Dependency resolution utilities
pub mod dependency {
    use parking_lot::Mutex;
    use std::thread::{self, ThreadId};

    /// Tracks beans currently being created to detect circular dependencies.
    ///
    /// Entries are kept per thread so that two threads creating the same
    /// scoped bean are not mistaken for a cycle. Creation order is preserved
    /// so the reported chain reads in the order the container walked it.
    #[derive(Debug, Default)]
    pub struct CreationTracker {
        creating: Mutex<Vec<(ThreadId, String)>>,
    }

    impl CreationTracker {
        pub fn new() -> Self {
            Self::default()
        }

        /// Marks a bean as being created on the current thread.
        ///
        /// Returns `false` when the bean is already in creation, which means
        /// the caller has walked into a cycle.
        pub fn start_creating(&self, name: &str) -> bool {
            let current = thread::current().id();
            let mut creating = self.creating.lock();
            if creating.iter().any(|(id, n)| *id == current && n == name) {
                return false;
            }
            creating.push((current, name.to_string()));
            true
        }

        pub fn finish_creating(&self, name: &str) {
            let current = thread::current().id();
            let mut creating = self.creating.lock();
            if let Some(pos) = creating
                .iter()
                .rposition(|(id, n)| *id == current && n == name)
            {
                creating.remove(pos);
            }
        }

        /// Snapshot of the creation chain of the current thread.
        pub fn current_creating(&self) -> Vec<String> {
            let current = thread::current().id();
            self.creating
                .lock()
                .iter()
                .filter(|(id, _)| *id == current)
                .map(|(_, n)| n.clone())
                .collect()
        }

        /// Marks `name` as in creation for as long as the guard lives.
        pub fn guard<'a>(&'a self, name: &str) -> Option<CreationGuard<'a>> {
            self.start_creating(name).then(|| CreationGuard {
                tracker: self,
                name: name.to_string(),
            })
        }
    }

    /// RAII guard clearing the creation mark on drop, also on error paths.
    pub struct CreationGuard<'a> {
        tracker: &'a CreationTracker,
        name: String,
    }

    impl Drop for CreationGuard<'_> {
        fn drop(&mut self) {
            self.tracker.finish_creating(&self.name);
        }
    }
}
