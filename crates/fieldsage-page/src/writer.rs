//! Writing a value into a located field

use crate::classify::{classify, ControlKind, NativeKind};
use crate::config::PageConfig;
use crate::driver::{DomEvent, Locator, PageDriver};
use crate::error::PageError;
use crate::extract::element_at;
use crate::label::text_of;
use crate::locate::{locate, LocatedField};
use crate::selectors::{compile, DROPDOWN_OPTION, DROPDOWN_SEARCH_INPUT};
use crate::value::read_value;
use scraper::Html;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// Applies values to fields through a `PageDriver`
#[derive(Debug, Clone, Default)]
pub struct FieldWriter {
    config: PageConfig,
}

impl FieldWriter {
    /// Create a writer
    pub fn new(config: PageConfig) -> Self {
        Self { config }
    }

    /// Write `value` into the field `field_id`.
    ///
    /// Fails when nothing can be located for the id or a write step fails.
    /// Nothing is retried.
    pub async fn apply(
        &self,
        driver: &dyn PageDriver,
        field_id: &str,
        value: &str,
    ) -> Result<(), PageError> {
        let markup = driver.snapshot().await?;
        let LocatedField { locator, kind } = locate(&Html::parse_document(&markup), field_id)
            .ok_or_else(|| PageError::NotFound(field_id.to_string()))?;

        info!("Applying value to '{}' ({:?}) at {}", field_id, kind, locator);

        match kind {
            ControlKind::Dropdown => self.write_dropdown(driver, &locator, value).await?,
            ControlKind::Native(NativeKind::Select) => {
                let index = option_index(&markup, &locator, value)?;
                driver.select_index(&locator, index).await?;
            }
            ControlKind::RichText => {
                driver.focus(&locator).await?;
                driver.replace_text(&locator, value).await?;
                driver.dispatch(&locator, DomEvent::Input).await?;
            }
            ControlKind::Native(_) => {
                driver.focus(&locator).await?;
                driver.set_value(&locator, value).await?;
            }
        }

        for event in [DomEvent::Input, DomEvent::Change, DomEvent::Blur] {
            driver.dispatch(&locator, event).await?;
        }

        // Frameworks that shadow `.value` only see the prototype setter
        if kind == ControlKind::Native(NativeKind::Input) {
            driver.set_value(&locator, value).await?;
            driver.dispatch(&locator, DomEvent::Input).await?;
        }

        Ok(())
    }

    /// Open, search, pick the best option, then wait for the widget to show it
    async fn write_dropdown(
        &self,
        driver: &dyn PageDriver,
        widget: &Locator,
        value: &str,
    ) -> Result<(), PageError> {
        driver.click(widget).await?;

        let markup = driver.snapshot().await?;
        if let Some(search) = search_input(&markup, widget) {
            debug!("Typing into dropdown search {}", search);
            driver.set_value(&search, value).await?;
            driver.dispatch(&search, DomEvent::Input).await?;
        }

        let options = self
            .wait_for(driver, &format!("options of {}", widget), |markup| {
                let options = dropdown_options(markup, widget);
                (!options.is_empty()).then_some(options)
            })
            .await?;

        let (option, label) = best_option(&options, value);
        if !label.eq_ignore_ascii_case(value.trim()) {
            warn!("No exact option for {:?}; choosing {:?}", value, label);
        }
        driver.click(option).await?;

        let expected = label.to_string();
        self.wait_for(driver, &format!("{} to show {:?}", widget, expected), |markup| {
            let doc = Html::parse_document(markup);
            let el = element_at(&doc, widget)?;
            let kind = classify(&el)?;
            read_value(el, kind).eq_ignore_ascii_case(&expected).then_some(())
        })
        .await
    }

    /// Poll snapshots until `check` yields, bounded by the configured timeout
    async fn wait_for<T, F>(
        &self,
        driver: &dyn PageDriver,
        what: &str,
        mut check: F,
    ) -> Result<T, PageError>
    where
        F: FnMut(&str) -> Option<T> + Send,
        T: Send,
    {
        let deadline = Instant::now() + self.config.wait_timeout();
        loop {
            let markup = driver.snapshot().await?;
            if let Some(found) = check(&markup) {
                return Ok(found);
            }
            if Instant::now() >= deadline {
                warn!("Gave up waiting for {}", what);
                return Err(PageError::Timeout(what.to_string()));
            }
            sleep(self.config.poll_interval()).await;
        }
    }
}

/// Index of the option matching `value` by value or text, exact then ignoring case
fn option_index(markup: &str, select: &Locator, value: &str) -> Result<usize, PageError> {
    let doc = Html::parse_document(markup);
    let el = element_at(&doc, select).ok_or_else(|| PageError::NotFound(select.to_string()))?;
    let selector = compile("option").ok_or_else(|| PageError::InvalidSelector("option".into()))?;
    let options: Vec<(String, String)> = el
        .select(&selector)
        .map(|o| {
            let text = text_of(o);
            let val = o.value().attr("value").map(str::to_string).unwrap_or_else(|| text.clone());
            (val, text)
        })
        .collect();

    let wanted = value.trim();
    options
        .iter()
        .position(|(v, t)| v == wanted || t == wanted)
        .or_else(|| {
            options
                .iter()
                .position(|(v, t)| v.eq_ignore_ascii_case(wanted) || t.eq_ignore_ascii_case(wanted))
        })
        .ok_or_else(|| PageError::Driver(format!("No option matching {:?}", wanted)))
}

/// Search box inside the widget, or the widget itself when it is an input
fn search_input(markup: &str, widget: &Locator) -> Option<Locator> {
    let doc = Html::parse_document(markup);
    let el = element_at(&doc, widget)?;
    if el.value().name() == "input" {
        return Some(widget.clone());
    }
    let selector = compile(DROPDOWN_SEARCH_INPUT)?;
    el.select(&selector)
        .next()
        .map(|_| widget.descendant(DROPDOWN_SEARCH_INPUT))
}

/// Options rendered for the widget: inside it first, else anywhere (portals)
fn dropdown_options(markup: &str, widget: &Locator) -> Vec<(Locator, String)> {
    let doc = Html::parse_document(markup);
    let scoped = widget.descendant(DROPDOWN_OPTION);
    let scope = match element_at(&doc, &scoped) {
        Some(_) if widget.index() == 0 => scoped.as_str().to_string(),
        _ => DROPDOWN_OPTION.to_string(),
    };
    let Some(selector) = compile(&scope) else {
        return Vec::new();
    };
    doc.select(&selector)
        .enumerate()
        .map(|(i, o)| (Locator::nth(scope.clone(), i), text_of(o)))
        .collect()
}

/// Exact label ignoring case, else substring, else the first option
fn best_option<'a>(options: &'a [(Locator, String)], value: &str) -> (&'a Locator, &'a str) {
    let wanted = value.trim().to_lowercase();
    let pick = options
        .iter()
        .find(|(_, l)| l.to_lowercase() == wanted)
        .or_else(|| {
            options
                .iter()
                .find(|(_, l)| !wanted.is_empty() && l.to_lowercase().contains(&wanted))
        })
        .or_else(|| {
            options
                .iter()
                .find(|(_, l)| !l.is_empty() && wanted.contains(&l.to_lowercase()))
        })
        .unwrap_or(&options[0]);
    (&pick.0, pick.1.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(labels: &[&str]) -> Vec<(Locator, String)> {
        labels
            .iter()
            .enumerate()
            .map(|(i, l)| (Locator::nth("[role=\"option\"]", i), l.to_string()))
            .collect()
    }

    #[test]
    fn test_best_option_preference() {
        let options = opts(&["Database Server", "Database", "Middleware"]);
        assert_eq!(best_option(&options, "database").1, "Database");
        assert_eq!(best_option(&options, "middle").1, "Middleware");
        assert_eq!(best_option(&options, "Something else").1, "Database Server");
    }

    #[test]
    fn test_option_index_by_value_then_text() {
        let markup = r#"<select name="s"><option value="db">Database</option><option value="os">Operating System</option></select>"#;
        let select = Locator::new("[name=\"s\"]");
        assert_eq!(option_index(markup, &select, "os").unwrap(), 1);
        assert_eq!(option_index(markup, &select, "Database").unwrap(), 0);
        assert_eq!(option_index(markup, &select, "operating system").unwrap(), 1);
        assert!(option_index(markup, &select, "Cloud").is_err());
    }
}
