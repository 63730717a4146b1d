//! Access to browser facilities the controllers depend on.
//!
//! Controllers never touch `web_sys` directly: object URLs, the clock and
//! page navigation go through [`Browser`], so tests can swap in a recorder.

/// Environment seam for object URLs, time and navigation.
pub trait Browser {
    /// Platform file handle.
    type File: Clone + 'static;

    /// Issue an object URL for a staged file, if the platform allows it.
    fn create_object_url(&self, file: &Self::File) -> Option<String>;

    /// Release an object URL previously issued by [`Browser::create_object_url`].
    fn revoke_object_url(&self, url: &str);

    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;

    /// Navigate the whole page.
    fn navigate(&self, href: &str);

    /// Reload the current page.
    fn reload(&self);
}

/// [`Browser`] backed by the real `window`.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebBrowser;

impl Browser for WebBrowser {
    type File = web_sys::File;

    fn create_object_url(&self, file: &web_sys::File) -> Option<String> {
        match web_sys::Url::create_object_url_with_blob(file) {
            Ok(url) => Some(url),
            Err(e) => {
                log::warn!("Failed to create object URL for {}: {:?}", file.name(), e);
                None
            }
        }
    }

    fn revoke_object_url(&self, url: &str) {
        if let Err(e) = web_sys::Url::revoke_object_url(url) {
            log::warn!("Failed to revoke object URL: {:?}", e);
        }
    }

    fn now_millis(&self) -> u64 {
        js_sys::Date::now() as u64
    }

    fn navigate(&self, href: &str) {
        if let Some(window) = web_sys::window() {
            if let Err(e) = window.location().set_href(href) {
                log::error!("Navigation to {} failed: {:?}", href, e);
            }
        }
    }

    fn reload(&self) {
        if let Some(window) = web_sys::window() {
            if let Err(e) = window.location().reload() {
                log::error!("Reload failed: {:?}", e);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::Browser;

    #[derive(Debug, Default)]
    pub struct Journal {
        pub issued: Vec<String>,
        pub revoked: Vec<String>,
        pub navigations: Vec<String>,
        pub reloads: usize,
        pub clock: u64,
        next_id: usize,
    }

    impl Journal {
        /// Object URLs issued and not yet revoked.
        pub fn live(&self) -> Vec<String> {
            self.issued
                .iter()
                .filter(|url| !self.revoked.contains(url))
                .cloned()
                .collect()
        }
    }

    /// Recording browser; the file handle is just a label.
    #[derive(Clone, Debug, Default)]
    pub struct FakeBrowser {
        pub journal: Rc<RefCell<Journal>>,
    }

    impl FakeBrowser {
        pub fn at(clock: u64) -> Self {
            let browser = Self::default();
            browser.journal.borrow_mut().clock = clock;
            browser
        }
    }

    impl Browser for FakeBrowser {
        type File = &'static str;

        fn create_object_url(&self, file: &&'static str) -> Option<String> {
            let mut journal = self.journal.borrow_mut();
            journal.next_id += 1;
            let url = format!("blob:{}#{}", file, journal.next_id);
            journal.issued.push(url.clone());
            Some(url)
        }

        fn revoke_object_url(&self, url: &str) {
            let mut journal = self.journal.borrow_mut();
            assert!(
                !journal.revoked.iter().any(|u| u == url),
                "double release of {url}"
            );
            journal.revoked.push(url.to_string());
        }

        fn now_millis(&self) -> u64 {
            self.journal.borrow().clock
        }

        fn navigate(&self, href: &str) {
            self.journal.borrow_mut().navigations.push(href.to_string());
        }

        fn reload(&self) {
            self.journal.borrow_mut().reloads += 1;
        }
    }
}
