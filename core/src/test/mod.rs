#![allow(clippy::unwrap_used, clippy::panic)]

use std::time::Duration;


/// Let spawned timers and fetches run to completion on the paused clock.
pub async fn settle() {
    for _ in 0..4 {
        tokio::time::sleep(Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
    }
}

/// Navigator that remembers where it was sent.
#[derive(Default)]
pub struct RecordingNavigator {
    routes: std::sync::Mutex<Vec<crate::input::Route>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<crate::input::Route> {
        self.routes.lock().unwrap().clone()
    }
}

impl crate::input::Navigator for RecordingNavigator {
    fn navigate(&self, route: crate::input::Route) {
        self.routes.lock().unwrap().push(route);
    }
}
