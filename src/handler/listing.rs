//! Directory listing generation

use crate::http::escape::{HtmlEscaped, UrlEncoded};
use std::ffi::OsString;
use std::fmt::{self, Write as _};
use std::io;
use std::path::Path;

/// One immediate child of the listed directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: OsString,
    pub is_dir: bool,
    pub size: u64,
}

/// Read the immediate children of `dir`, sorted by name bytes
///
/// Entries whose metadata cannot be read (dangling symlinks, races with
/// deletion) are left out.
pub fn read_entries(dir: &Path) -> io::Result<Vec<Entry>> {
    let mut entries: Vec<Entry> = std::fs::read_dir(dir)?
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let metadata = std::fs::metadata(entry.path()).ok()?;
            Some(Entry {
                name: entry.file_name(),
                is_dir: metadata.is_dir(),
                size: metadata.len(),
            })
        })
        .collect();
    entries.sort_by(|a, b| a.name.as_encoded_bytes().cmp(b.name.as_encoded_bytes()));
    Ok(entries)
}

/// Listing body: parent link, then one line per entry
struct Listing<'a>(&'a [Entry]);

impl fmt::Display for Listing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let max_len = self
            .0
            .iter()
            .map(|entry| entry.name.to_string_lossy().chars().count())
            .max()
            .unwrap_or(2);

        writeln!(f, "<a href=\"..\">..</a>/")?;

        for entry in self.0 {
            let display = entry.name.to_string_lossy();
            let href = UrlEncoded(entry.name.as_encoded_bytes());
            if entry.is_dir {
                writeln!(f, "<a href=\"{href}/\">{}</a>/", HtmlEscaped(&display))?;
            } else {
                let padding = max_len - display.chars().count();
                writeln!(
                    f,
                    "<a href=\"{href}\">{}</a>{:padding$} {:>10}",
                    HtmlEscaped(&display),
                    "",
                    entry.size
                )?;
            }
        }
        Ok(())
    }
}

/// Render the HTML index of `dir`
///
/// `url_path` is the request path exactly as the client sent it; it
/// titles the page.
pub fn render(dir: &Path, url_path: &str, footer: &str) -> io::Result<String> {
    let entries = read_entries(dir)?;
    Ok(render_entries(&entries, url_path, footer))
}

pub fn render_entries(entries: &[Entry], url_path: &str, footer: &str) -> String {
    let title = HtmlEscaped(url_path);
    let mut page = String::new();
    // Writing into a String cannot fail
    let _ = write!(
        page,
        "<html>\n<head>\n<title>{title}</title>\n\
        <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
        </head>\n<body>\n<h1>{title}</h1>\n<tt><pre>\n\
        {}\
        </pre></tt>\n\
        <hr>\n\
        {footer}\n\
        </body>\n</html>\n",
        Listing(entries),
    );
    page
}
