use reqwest::Response;

pub(crate) trait Notify {
    fn notify(self) -> Self;
}

impl Notify for Response {
    /// Logs the response status and forwards any `npm-notice` headers the
    /// registry sent along.
    fn notify(self) -> Self {
        tracing::debug!("{} responded with {}", self.url(), self.status());
        for notice in self.headers().get_all("npm-notice") {
            if let Ok(notice) = notice.to_str() {
                tracing::info!("npm notice: {notice}");
            }
        }
        self
    }
}
