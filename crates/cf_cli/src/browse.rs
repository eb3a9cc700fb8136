use anyhow::Result;
use cf_feed::{
    ConceptDisclosure, FeedConfig, FeedState, FeedStateMachine, HttpFeedFetcher, Theme,
    ThemePreference,
};
use crossterm::style::{Color, Stylize};
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

const HELP: &str = "[n]ext  [p]rev  [m]ore/less  [1-9] concept  [t]heme  [q]uit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Next,
    Prev,
    ToggleContent,
    ToggleConcept(usize),
    ToggleTheme,
    Quit,
    Unknown,
}

fn parse_key(line: &str) -> Key {
    match line.trim() {
        "" | "n" => Key::Next,
        "p" => Key::Prev,
        "m" => Key::ToggleContent,
        "t" => Key::ToggleTheme,
        "q" => Key::Quit,
        other => match other.parse::<usize>() {
            Ok(n) if n >= 1 => Key::ToggleConcept(n - 1),
            _ => Key::Unknown,
        },
    }
}

struct Palette {
    title: Color,
    accent: Color,
    muted: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                title: Color::DarkBlue,
                accent: Color::Blue,
                muted: Color::DarkGrey,
            },
            Theme::Dark => Self {
                title: Color::White,
                accent: Color::Cyan,
                muted: Color::Grey,
            },
        }
    }
}

/// Renders the card at `index`, or the loading / empty / error screen.
fn render(state: &FeedState, index: usize, disclosure: &ConceptDisclosure, theme: Theme) -> String {
    let palette = Palette::for_theme(theme);
    let mut out = String::new();

    if state.loading_initial() {
        return "Loading articles...".with(palette.muted).to_string();
    }

    let Some(item) = state.items.get(index) else {
        if state.loading_more {
            return "Loading more articles...".with(palette.muted).to_string();
        }
        if let Some(error) = &state.error {
            return format!("{} {}", "Failed to load articles:".red(), error);
        }
        return "No articles found.".with(palette.muted).to_string();
    };

    let article = &item.article;
    let _ = writeln!(
        out,
        "{} {}",
        format!("[{}/{}]", index + 1, state.items.len()).with(palette.muted),
        article.title.as_str().bold().with(palette.title)
    );
    let _ = writeln!(
        out,
        "{}",
        article.published_at.format("%Y-%m-%d %H:%M UTC").to_string().with(palette.muted)
    );
    if !article.image_url.is_empty() {
        let _ = writeln!(out, "{}", article.image_url.as_str().with(palette.muted));
    }
    let _ = writeln!(out);

    let body = if disclosure.shows_full_content(article.id) || article.quick_summary.is_empty() {
        &article.content
    } else {
        &article.quick_summary
    };
    let _ = writeln!(out, "{}", body);

    match &item.concepts {
        None => {}
        Some(concepts) if concepts.is_empty() => {
            let _ = writeln!(out, "\n{}", "No concepts found.".with(palette.muted));
        }
        Some(concepts) => {
            let _ = writeln!(out, "\n{}", "Concepts".bold().with(palette.accent));
            for (i, concept) in concepts.iter().enumerate() {
                let open = disclosure.is_expanded(article.id, concept.id);
                let marker = if open { "▾" } else { "▸" };
                let _ = writeln!(out, "  {} {} {}", i + 1, marker, concept.name.as_str().with(palette.accent));
                if open {
                    for line in concept.info.lines() {
                        let _ = writeln!(out, "      {}", line);
                    }
                }
            }
        }
    }

    if state.loading_more && index + 1 == state.items.len() {
        let _ = writeln!(out, "\n{}", "Loading more articles...".with(palette.muted));
    }
    out
}

/// Terminal presentation layer: reads one command per line and re-renders.
pub async fn run(api: &str, config: FeedConfig, theme: ThemePreference) -> Result<()> {
    let fetcher = Arc::new(HttpFeedFetcher::new(api)?);
    let feed = Arc::new(FeedStateMachine::new(fetcher.clone(), config)?);
    let page_size = feed.config().initial_page_size;

    match fetcher.fetch_hydrated_page(page_size, 0).await {
        Ok(page) if !page.is_empty() => feed.initialize_hydrated(page).await,
        Ok(_) => feed.initialize(None).await,
        Err(e) => {
            warn!("Prefetch from /api/feed failed, loading directly: {}", e);
            feed.initialize(None).await;
        }
    }

    let mut disclosure = ConceptDisclosure::new();
    let mut index = 0usize;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let state = feed.snapshot();
        println!("\n{}\n{}", render(&state, index, &disclosure, theme.get()), HELP);

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let state = feed.snapshot();
        let current = state.items.get(index).map(|item| item.id());

        match parse_key(&line) {
            Key::Quit => break,
            Key::Next => {
                if index + 1 < state.items.len() {
                    index += 1;
                }
                let feed = feed.clone();
                let position = index;
                tokio::spawn(async move {
                    feed.advance(position).await;
                });
            }
            Key::Prev => index = index.saturating_sub(1),
            Key::ToggleContent => {
                if let Some(id) = current {
                    disclosure.toggle_content(id);
                }
            }
            Key::ToggleConcept(n) => {
                let concept = state
                    .items
                    .get(index)
                    .and_then(|item| item.concepts.as_ref())
                    .and_then(|concepts| concepts.get(n));
                if let (Some(article), Some(concept)) = (current, concept) {
                    disclosure.toggle(article, concept.id);
                }
            }
            Key::ToggleTheme => {
                if let Err(e) = theme.toggle() {
                    warn!("Could not save theme preference: {}", e);
                }
            }
            Key::Unknown => println!("{}", HELP),
        }
    }

    Ok(())
}
