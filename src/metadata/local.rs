//! Local-storage [`MetadataScraper`].
//!
//! Writes a Kodi-style NFO (`movie.nfo` / `tvshow.nfo`) and downloads
//! `poster.jpg` and `fanart.jpg` into the scraped directory. Existing files
//! are kept unless the caller asks to overwrite.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use libscraper_common::MediaType;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::writer::Writer;
use reqwest::blocking::Client;
use tracing::{debug, info, warn};

use super::provider::{FileItem, MediaIdentity, MetadataScraper};

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Scraper for directories on local storage.
pub struct LocalScraper {
    client: Client,
}

impl LocalScraper {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }

    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let bytes = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("Image request failed: {url}"))?
            .error_for_status()
            .with_context(|| format!("Image request returned error: {url}"))?
            .bytes()
            .with_context(|| format!("Failed to read image body: {url}"))?;
        std::fs::write(dest, &bytes)
            .with_context(|| format!("Failed to write image: {:?}", dest))?;
        Ok(())
    }

    fn save_image(&self, url: Option<&str>, dest: PathBuf, overwrite: bool) {
        let Some(url) = url else {
            return;
        };
        if dest.exists() && !overwrite {
            debug!("{:?} exists, keeping", dest);
            return;
        }
        match self.download(url, &dest) {
            Ok(()) => debug!(url = url, dest = %dest.display(), "Saved image"),
            Err(e) => warn!(url = url, error = %e, "Failed to download image"),
        }
    }
}

/// NFO file name for a media type; anything not TV is a movie.
pub fn nfo_file_name(media_type: MediaType) -> &'static str {
    match media_type {
        MediaType::Tv => "tvshow.nfo",
        MediaType::Movie | MediaType::Unknown => "movie.nfo",
    }
}

/// Render the NFO document for an identity.
pub fn render_nfo(identity: &MediaIdentity) -> Result<String> {
    let root = match identity.media_type {
        MediaType::Tv => "tvshow",
        MediaType::Movie | MediaType::Unknown => "movie",
    };
    let tmdb_id = identity.tmdb_id.to_string();
    let year = identity.year.map(|y| y.to_string());

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), Some("yes"))))?;
    writer.write_event(Event::Start(BytesStart::new(root)))?;

    write_text(&mut writer, BytesStart::new("title"), &identity.title)?;
    if let Some(ref original) = identity.original_title {
        write_text(&mut writer, BytesStart::new("originaltitle"), original)?;
    }
    if let Some(ref year) = year {
        write_text(&mut writer, BytesStart::new("year"), year)?;
    }
    if let Some(ref plot) = identity.overview {
        write_text(&mut writer, BytesStart::new("plot"), plot)?;
    }
    write_text(
        &mut writer,
        BytesStart::new("uniqueid").with_attributes([("type", "tmdb"), ("default", "true")]),
        &tmdb_id,
    )?;
    if let Some(ref imdb) = identity.imdb_id {
        write_text(
            &mut writer,
            BytesStart::new("uniqueid").with_attributes([("type", "imdb")]),
            imdb,
        )?;
    }
    write_text(&mut writer, BytesStart::new("tmdbid"), &tmdb_id)?;

    writer.write_event(Event::End(BytesEnd::new(root)))?;

    String::from_utf8(writer.into_inner()).context("NFO is not valid UTF-8")
}

fn write_text(writer: &mut Writer<Vec<u8>>, start: BytesStart<'_>, text: &str) -> Result<()> {
    let end = start.to_end().into_owned();
    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(end))?;
    Ok(())
}

impl MetadataScraper for LocalScraper {
    fn scrape(&self, item: &FileItem, identity: &MediaIdentity, overwrite: bool) -> Result<()> {
        if item.storage != "local" {
            bail!("Unsupported storage: {}", item.storage);
        }

        let dir = PathBuf::from(&item.path);
        if !dir.is_dir() {
            bail!("Directory does not exist: {}", item.path);
        }

        let nfo_path = dir.join(nfo_file_name(identity.media_type));
        if nfo_path.exists() && !overwrite {
            debug!("{:?} exists, keeping", nfo_path);
        } else {
            let nfo = render_nfo(identity)?;
            std::fs::write(&nfo_path, nfo)
                .with_context(|| format!("Failed to write NFO: {:?}", nfo_path))?;
            info!(nfo = %nfo_path.display(), tmdb_id = identity.tmdb_id, "Wrote NFO");
        }

        self.save_image(identity.images.poster.as_deref(), dir.join("poster.jpg"), overwrite);
        self.save_image(identity.images.backdrop.as_deref(), dir.join("fanart.jpg"), overwrite);

        Ok(())
    }
}
