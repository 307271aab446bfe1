pub mod config;
pub mod delivery;
pub mod error;
pub mod format;
pub mod locator;
pub mod models;
pub mod relay;
pub mod render;
pub mod retriever;
pub mod scraping;
pub mod session;
mod utils;

use std::path::PathBuf;

use tracing::{info, instrument};

use config::AppConfig;
use error::ShareError;
use format::DisplayZone;
use models::{EventRecord, Format};
use relay::Transport;
use render::capability::BlurCapability;
use render::Compositor;
use retriever::Retriever;
use session::Session;

pub use utils::config_path;

pub fn session_from_config(config: &AppConfig) -> Session {
    Session::new(
        config.template.clone(),
        config.language,
        DisplayZone::from_name(&config.time_zone),
    )
}

/// Link in, normalized record out. The record is also stored in `session`.
#[instrument(skip(transport, config, session))]
pub async fn load_event<T: Transport>(
    transport: &T,
    config: &AppConfig,
    session: &mut Session,
    link: &str,
) -> Result<EventRecord, ShareError> {
    let event_id = locator::locate(link)?;
    let html = Retriever::new(transport, &config.relays)
        .fetch_document(&event_id)
        .await?;
    let record = scraping::extract(&html, &event_id, &session.formatter());
    info!(event_id = %record.event_id, title = %record.title, "extracted event");
    session.load(record.clone());
    Ok(record)
}

/// Renders one format for the session's current event and saves it.
pub async fn download<T: Transport>(
    transport: &T,
    config: &AppConfig,
    capability: BlurCapability,
    session: &Session,
    format: Format,
) -> Result<PathBuf, ShareError> {
    let record = session
        .record()
        .ok_or_else(|| ShareError::RenderFailure("no event loaded".to_string()))?;
    let compositor = Compositor::new(
        transport,
        &config.image_relays,
        capability,
        config.settle_delay(),
    );
    let png = compositor
        .render_png(format, record, session.template())
        .await?;
    delivery::save_png(&config.output_dir(), format, &record.event_id, &png)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Language;
    use crate::relay::stub::StubTransport;

    const PAGE: &str = r#"<!DOCTYPE html><html><head>
      <meta property="og:title" content="Founders Breakfast">
      <script type="application/ld+json">
        {"@type":"Event","name":"Founders Breakfast","startDate":"2025-03-15T09:00:00Z",
         "endDate":"2025-03-15T10:30:00Z","image":["https://images.lumacdn.com/event-covers/f.png"]}
      </script>
    </head><body></body></html>"#;

    fn config(out: PathBuf) -> AppConfig {
        AppConfig {
            relays: vec!["https://relay.test/?".to_string()],
            image_relays: vec!["https://relay.test/?".to_string()],
            template: "gradient-purple".to_string(),
            language: Language::En,
            time_zone: "UTC".to_string(),
            output_dir: Some(out),
            settle_delay_ms: 0,
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn link_to_saved_story_and_post() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(tmp.path().to_path_buf());
        let transport = StubTransport::default()
            .with_text("https://relay.test/?https%3A%2F%2Flu.ma%2Fbrk25", Ok(PAGE));
        let mut session = session_from_config(&config);

        let record = load_event(&transport, &config, &mut session, "lu.ma/brk25")
            .await
            .expect("event loads");
        assert_eq!(record.title, "Founders Breakfast");
        assert_eq!(record.formatted_time, "09:00 AM - 10:30 AM");
        assert_eq!(session.record(), Some(&record));
        assert_eq!(
            record.image_url.as_deref(),
            Some("https://images.lumacdn.com/event-covers/f.png")
        );

        for format in Format::ALL {
            let path = download(&transport, &config, BlurCapability::SupportsBlur, &session, format)
                .await
                .expect("renders");
            assert_eq!(path, tmp.path().join(format.file_name("brk25")));
            let (w, h) = image::image_dimensions(&path).expect("readable png");
            assert_eq!((w, h), format.dimensions());
        }
    }

    #[tokio::test]
    async fn invalid_link_never_touches_the_network() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(tmp.path().to_path_buf());
        let transport = StubTransport::default();
        let mut session = session_from_config(&config);

        let err = load_event(&transport, &config, &mut session, "https://example.com/abc123")
            .await
            .unwrap_err();
        assert!(matches!(err, ShareError::InvalidLink));
        assert!(transport.requested.borrow().is_empty());
        assert!(session.record().is_none());
    }

    #[tokio::test]
    async fn download_without_event_is_a_render_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(tmp.path().to_path_buf());
        let session = session_from_config(&config);

        let err = download(
            &StubTransport::default(),
            &config,
            BlurCapability::SupportsBlur,
            &session,
            Format::Story,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ShareError::RenderFailure(_)));
    }
}
