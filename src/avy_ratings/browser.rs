// avy_ratings - Scrape and analyze historical avalanche danger ratings
//
// Copyright 2022 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::{Stream, StreamExt};
use std::error;
use std::fmt;
use std::io;
use tokio::task::JoinHandle;

#[derive(Debug)]
pub enum BrowserError {
    Config(String),
    Cdp(CdpError),
    Decode(serde_json::Error),
    Process(io::Error),
}

impl fmt::Display for BrowserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "invalid browser configuration: {}", msg),
            Self::Cdp(e) => write!(f, "browser error: {}", e),
            Self::Decode(e) => write!(f, "unexpected element query result: {}", e),
            Self::Process(e) => write!(f, "browser process error: {}", e),
        }
    }
}

impl error::Error for BrowserError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Cdp(e) => Some(e),
            Self::Decode(e) => Some(e),
            Self::Process(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CdpError> for BrowserError {
    fn from(e: CdpError) -> Self {
        Self::Cdp(e)
    }
}

/// Minimal browser surface needed to read rendered archive pages.
#[async_trait]
pub trait PageDriver: Send {
    /// Navigate to `url`. Returns once the navigation has been committed; client-side
    /// rendering may still be in progress.
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Text content of every element matching `xpath` in the current page, in document
    /// order. No matches is an empty list, not an error.
    async fn texts(&mut self, xpath: &str) -> Result<Vec<String>, BrowserError>;

    /// Shut the browser down. Must be safe to call once per driver after any other failure.
    async fn close(self) -> Result<(), BrowserError>;
}

/// `PageDriver` backed by a Chromium process controlled over the DevTools protocol.
pub struct ChromeDriver {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromeDriver {
    /// Launch a new browser process, headless unless `show_window` is set.
    pub async fn launch(show_window: bool) -> Result<Self, BrowserError> {
        let builder = BrowserConfig::builder();
        let builder = if show_window { builder.with_head() } else { builder };
        let config = builder.build().map_err(BrowserError::Config)?;

        let (mut browser, events) = Browser::launch(config).await?;
        // DevTools messages are only processed while the handler stream is polled.
        let handler = tokio::spawn(async move {
            let handled = drive_events(events).await;
            tracing::debug!(message = "browser event handler stopped", events = handled);
        });

        let page = match browser.new_page("about:blank").await {
            Ok(p) => p,
            Err(e) => {
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler.abort();
                return Err(e.into());
            }
        };

        tracing::debug!(message = "launched browser", show_window = show_window);
        Ok(ChromeDriver { browser, page, handler })
    }

    fn text_query(xpath: &str) -> String {
        // Serializing the XPath as a JSON string gives a valid, escaped JS string literal.
        let literal = serde_json::Value::String(xpath.to_owned()).to_string();
        format!(
            "(() => {{ \
                const res = document.evaluate({}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
                const out = []; \
                for (let i = 0; i < res.snapshotLength; i++) {{ out.push(res.snapshotItem(i).textContent || ''); }} \
                return out; \
            }})()",
            literal
        )
    }
}

/// Poll browser events until the stream ends, returning how many were handled. Errors
/// for single messages are logged and skipped.
async fn drive_events<S, E>(mut events: S) -> usize
where
    S: Stream<Item = Result<(), E>> + Unpin,
    E: fmt::Display,
{
    let mut handled = 0;
    while let Some(res) = events.next().await {
        handled += 1;
        if let Err(e) = res {
            tracing::debug!(message = "browser event error", error = %e);
        }
    }

    handled
}

#[async_trait]
impl PageDriver for ChromeDriver {
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError> {
        tracing::debug!(message = "navigating", url = %url);
        self.page.goto(url).await?;
        Ok(())
    }

    async fn texts(&mut self, xpath: &str) -> Result<Vec<String>, BrowserError> {
        let res = self.page.evaluate(Self::text_query(xpath)).await?;
        let texts: Vec<String> = res.into_value().map_err(BrowserError::Decode)?;
        Ok(texts.into_iter().map(|t| t.trim().to_owned()).collect())
    }

    async fn close(mut self) -> Result<(), BrowserError> {
        let closed = self.browser.close().await;
        let waited = self.browser.wait().await;
        self.handler.abort();

        tracing::debug!(message = "closed browser");
        closed?;
        waited.map_err(BrowserError::Process)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{drive_events, ChromeDriver};

    #[test]
    fn test_text_query_escapes_xpath() {
        let js = ChromeDriver::text_query("//*[@class=\"a\"]");
        assert!(js.contains(r#""//*[@class=\"a\"]""#));
        assert!(js.contains("ORDERED_NODE_SNAPSHOT_TYPE"));
    }

    #[tokio::test]
    async fn test_drive_events_continues_after_error() {
        let events = futures::stream::iter(vec![Ok(()), Err("undecodable message"), Ok(()), Err("another"), Ok(())]);
        assert_eq!(5, drive_events(events).await);
    }
}
