use crate::api::Fetch;
use crate::models::{Generation, Location, Move, Pokemon, Record};
use crate::session::{GroupedListing, GroupedSession, ListingSession, SessionStatus, Source};
use crate::utils::{
    format_name, is_light, matches_query, paginate, sprite_url, stat_abbrev, text_to_lines,
    type_color,
};
use image::imageops::FilterType;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Span, Spans};
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Tabs, Wrap};
use ratatui::{Frame, Terminal};
use std::collections::HashMap;
use std::io;
use std::io::Stdout;
use std::sync::{Arc, Mutex, PoisonError};

const THUMB_W: u32 = 48;
const THUMB_H: u32 = 48;

/// Compact RGB thumbnail stored in the in-memory cache.
pub struct SpriteThumb {
    pub w: u32,
    pub h: u32,
    /// RGB pixels in row-major order (len = w*h*3)
    pub pixels: Vec<u8>,
}

/// `None` marks a sprite that is loading or failed to load; neither is retried.
type SpriteCache = Arc<Mutex<HashMap<u32, Option<SpriteThumb>>>>;

/// What the detail pane shows for the selected row.
#[derive(Debug, Clone)]
pub enum Detail {
    Pokemon {
        pokemon: Pokemon,
        group: Option<String>,
    },
    Location(Location),
    Move(Move),
    Generation(Generation),
}

pub trait IntoDetail {
    fn into_detail(self) -> Detail;
}

impl IntoDetail for Pokemon {
    fn into_detail(self) -> Detail {
        Detail::Pokemon {
            pokemon: self,
            group: None,
        }
    }
}

impl IntoDetail for Location {
    fn into_detail(self) -> Detail {
        Detail::Location(self)
    }
}

impl IntoDetail for Move {
    fn into_detail(self) -> Detail {
        Detail::Move(self)
    }
}

impl IntoDetail for Generation {
    fn into_detail(self) -> Detail {
        Detail::Generation(self)
    }
}

/// Loading indicator state for the left-bottom box.
pub struct PaneStatus {
    pub loading: bool,
    pub ratio: f64,
    pub label: String,
    pub error: Option<String>,
}

/// Rows of the current page plus the highlighted row within it.
pub struct PaneRows {
    pub rows: Vec<String>,
    pub selected: Option<usize>,
    pub page: usize,
    pub page_count: usize,
    pub matched: usize,
}

/// One tab of the browser. Each pane owns its own listing session.
pub trait Pane {
    fn title(&self) -> &'static str;
    /// Begin loading if this pane hasn't yet.
    fn activate(&mut self);
    /// Throw away everything and load again from the index.
    fn restart(&mut self);
    /// Pick up new data and re-apply `query`.
    fn refresh(&mut self, query: &str);
    fn next(&mut self);
    fn previous(&mut self);
    fn jump(&mut self, delta: isize, page_size: usize);
    fn rows(&self, page_size: usize) -> PaneRows;
    fn detail(&self) -> Option<Detail>;
    fn status(&self) -> PaneStatus;
}

/// Selection over a filtered list of row indices.
#[derive(Default)]
struct Cursor {
    visible: Vec<usize>,
    selected: usize,
}

impl Cursor {
    fn set_visible(&mut self, visible: Vec<usize>) {
        self.visible = visible;
        if self.visible.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.visible.len() {
            self.selected = self.visible.len() - 1;
        }
    }

    fn next(&mut self) {
        if !self.visible.is_empty() {
            self.selected = (self.selected + 1) % self.visible.len();
        }
    }

    fn previous(&mut self) {
        if !self.visible.is_empty() {
            if self.selected == 0 {
                self.selected = self.visible.len() - 1;
            } else {
                self.selected -= 1;
            }
        }
    }

    fn jump(&mut self, delta: isize, page_size: usize) {
        if self.visible.is_empty() {
            return;
        }
        let step = delta.unsigned_abs() * page_size.max(1);
        self.selected = if delta < 0 {
            self.selected.saturating_sub(step)
        } else {
            (self.selected + step).min(self.visible.len() - 1)
        };
    }

    fn at_end(&self) -> bool {
        self.visible.is_empty() || self.selected + 1 >= self.visible.len()
    }

    fn current(&self) -> Option<usize> {
        self.visible.get(self.selected).copied()
    }

    fn page_rows(&self, labels: impl Fn(usize) -> String, page_size: usize) -> PaneRows {
        let page = paginate(&self.visible, self.selected / page_size.max(1), page_size);
        let selected = if self.visible.is_empty() {
            None
        } else {
            Some(self.selected - page.page * page_size.max(1))
        };
        PaneRows {
            rows: page.items.iter().map(|&i| labels(i)).collect(),
            selected,
            page: page.page,
            page_count: page.page_count,
            matched: self.visible.len(),
        }
    }
}

/// A flat listing tab backed by the progressive loader.
pub struct ListingPane<T> {
    title: &'static str,
    session: ListingSession<T>,
    cursor: Cursor,
    seen: Option<(u64, String)>,
}

impl<T: Record> ListingPane<T> {
    pub fn new(title: &'static str, source: Source) -> Self {
        Self {
            title,
            session: ListingSession::new(source),
            cursor: Cursor::default(),
            seen: None,
        }
    }
}

impl<T: Record + IntoDetail> Pane for ListingPane<T> {
    fn title(&self) -> &'static str {
        self.title
    }

    fn activate(&mut self) {
        self.session.start();
    }

    fn restart(&mut self) {
        self.session.restart();
        self.cursor = Cursor::default();
        self.seen = None;
    }

    fn refresh(&mut self, query: &str) {
        let revision = self.session.revision();
        if matches!(&self.seen, Some((r, q)) if *r == revision && q == query) {
            return;
        }
        let visible: Vec<usize> = self.session.view(|items| {
            items
                .iter()
                .enumerate()
                .filter(|(_, it)| matches_query(*it, query))
                .map(|(i, _)| i)
                .collect()
        });
        self.cursor.set_visible(visible);
        self.seen = Some((revision, query.to_string()));
    }

    fn next(&mut self) {
        self.cursor.next();
    }

    fn previous(&mut self) {
        self.cursor.previous();
    }

    fn jump(&mut self, delta: isize, page_size: usize) {
        self.cursor.jump(delta, page_size);
    }

    fn rows(&self, page_size: usize) -> PaneRows {
        self.session.view(|items| {
            self.cursor.page_rows(
                |i| {
                    items
                        .get(i)
                        .map(|it| format!("#{} {}", it.id(), format_name(it.name())))
                        .unwrap_or_default()
                },
                page_size,
            )
        })
    }

    fn detail(&self) -> Option<Detail> {
        let idx = self.cursor.current()?;
        self.session
            .view(|items| items.get(idx).cloned())
            .map(IntoDetail::into_detail)
    }

    fn status(&self) -> PaneStatus {
        let progress = self.session.progress();
        let error = match self.session.status() {
            SessionStatus::Failed(msg) => Some(msg),
            _ => None,
        };
        PaneStatus {
            loading: progress.in_progress,
            ratio: progress.ratio(),
            label: format!("Fetching {} ({}/{})", self.title, progress.fetched, progress.total),
            error,
        }
    }
}

/// Species grouped with their forms, loaded a batch at a time as the cursor
/// reaches the bottom of the list.
pub struct FormsPane {
    source: Source,
    batch_size: usize,
    listing: GroupedListing,
    rows: Vec<(String, Pokemon)>,
    cursor: Cursor,
    seen: Option<(u64, String)>,
    started: bool,
}

impl FormsPane {
    pub fn new(source: Source, batch_size: usize) -> Self {
        let listing = GroupedListing::new(GroupedSession::new(source.clone(), batch_size));
        Self {
            source,
            batch_size,
            listing,
            rows: Vec::new(),
            cursor: Cursor::default(),
            seen: None,
            started: false,
        }
    }

    fn want_more(&mut self) {
        if self.cursor.at_end() {
            self.listing.request_more();
        }
    }
}

impl Pane for FormsPane {
    fn title(&self) -> &'static str {
        "Forms"
    }

    fn activate(&mut self) {
        if !self.started {
            self.started = true;
            self.listing.request_more();
        }
    }

    fn restart(&mut self) {
        // dropping the old listing stops its batch before the next species
        self.listing = GroupedListing::new(GroupedSession::new(self.source.clone(), self.batch_size));
        self.rows.clear();
        self.cursor = Cursor::default();
        self.seen = None;
        self.started = true;
        self.listing.request_more();
    }

    fn refresh(&mut self, query: &str) {
        let revision = self.listing.revision();
        if matches!(&self.seen, Some((r, q)) if *r == revision && q == query) {
            return;
        }
        if self.seen.as_ref().map(|(r, _)| *r) != Some(revision) {
            let view = self.listing.snapshot();
            self.rows = view
                .groups
                .into_iter()
                .flat_map(|g| {
                    let group = g.group_name;
                    g.members.into_iter().map(move |m| (group.clone(), m))
                })
                .collect();
        }
        let visible: Vec<usize> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, (group, p))| {
                matches_query(p, query) || group.contains(&query.trim().to_lowercase())
            })
            .map(|(i, _)| i)
            .collect();
        self.cursor.set_visible(visible);
        self.seen = Some((revision, query.to_string()));
        // a filtered-out or short first batch shouldn't stall the listing
        if self.started && query.is_empty() {
            self.want_more();
        }
    }

    fn next(&mut self) {
        if self.cursor.at_end() {
            self.listing.request_more();
        } else {
            self.cursor.next();
        }
    }

    fn previous(&mut self) {
        self.cursor.previous();
    }

    fn jump(&mut self, delta: isize, page_size: usize) {
        self.cursor.jump(delta, page_size);
        self.want_more();
    }

    fn rows(&self, page_size: usize) -> PaneRows {
        self.cursor.page_rows(
            |i| {
                self.rows
                    .get(i)
                    .map(|(group, p)| {
                        format!("#{} {} [{}]", p.id, format_name(&p.name), format_name(group))
                    })
                    .unwrap_or_default()
            },
            page_size,
        )
    }

    fn detail(&self) -> Option<Detail> {
        let (group, pokemon) = self.rows.get(self.cursor.current()?)?.clone();
        Some(Detail::Pokemon {
            pokemon,
            group: Some(group),
        })
    }

    fn status(&self) -> PaneStatus {
        let view = self.listing.snapshot();
        let ratio = if view.total == 0 {
            0.0
        } else {
            view.examined as f64 / view.total as f64
        };
        PaneStatus {
            loading: view.loading,
            ratio: ratio.clamp(0.0, 1.0),
            label: format!("Fetching forms ({}/{} species)", view.examined, view.total),
            error: view.error,
        }
    }
}

pub struct App {
    pub panes: Vec<Box<dyn Pane>>,
    pub active: usize,
    pub page_size: usize,
    pub search_mode: bool,
    pub search_query: String,
    pub show_sprites: bool,
    pub show_help: bool,
    fetch: Arc<dyn Fetch>,
    // Thumbnails are decoded on a background task so the UI never waits on
    // the sprite host.
    sprite_cache: SpriteCache,
}

impl App {
    pub fn new(source: Source, batch_size: usize, page_size: usize) -> Self {
        let fetch = source.fetch.clone();
        let panes: Vec<Box<dyn Pane>> = vec![
            Box::new(ListingPane::<Pokemon>::new("Pokémon", source.clone())),
            Box::new(FormsPane::new(source.clone(), batch_size)),
            Box::new(ListingPane::<Location>::new("Locations", source.clone())),
            Box::new(ListingPane::<Move>::new("Moves", source.clone())),
            Box::new(ListingPane::<Generation>::new("Generations", source)),
        ];
        let mut app = Self {
            panes,
            active: 0,
            page_size: page_size.max(1),
            search_mode: false,
            search_query: String::new(),
            show_sprites: true,
            show_help: false,
            fetch,
            sprite_cache: Arc::new(Mutex::new(HashMap::new())),
        };
        app.pane_mut().activate();
        app
    }

    pub fn pane(&self) -> &dyn Pane {
        &*self.panes[self.active]
    }

    pub fn pane_mut(&mut self) -> &mut dyn Pane {
        &mut *self.panes[self.active]
    }

    pub fn switch_tab(&mut self, forward: bool) {
        let n = self.panes.len();
        self.active = if forward {
            (self.active + 1) % n
        } else {
            (self.active + n - 1) % n
        };
        self.pane_mut().activate();
        self.apply_filter();
    }

    pub fn next(&mut self) {
        self.pane_mut().next();
    }

    pub fn previous(&mut self) {
        self.pane_mut().previous();
    }

    pub fn next_page(&mut self) {
        let ps = self.page_size;
        self.pane_mut().jump(1, ps);
    }

    pub fn previous_page(&mut self) {
        let ps = self.page_size;
        self.pane_mut().jump(-1, ps);
    }

    pub fn restart(&mut self) {
        self.pane_mut().restart();
        self.apply_filter();
    }

    pub fn apply_filter(&mut self) {
        let q = self.search_query.to_lowercase();
        self.pane_mut().refresh(&q);
    }

    /// Kick off a sprite download for `p` unless one was already attempted.
    fn request_sprite(&self, p: &Pokemon) {
        {
            let mut cache = self.sprite_cache.lock().unwrap_or_else(PoisonError::into_inner);
            if cache.contains_key(&p.id) {
                return;
            }
            cache.insert(p.id, None);
        }
        let id = p.id;
        let url = sprite_url(p);
        let fetch = self.fetch.clone();
        let cache = self.sprite_cache.clone();
        tokio::spawn(async move {
            let bytes = match fetch.get_bytes(&url).await {
                Ok(b) => b,
                Err(e) => {
                    tracing::debug!(id, url = %url, error = %e, "sprite fetch failed");
                    return;
                }
            };
            let img = match image::load_from_memory(&bytes) {
                Ok(img) => img,
                Err(e) => {
                    tracing::debug!(id, error = %e, "sprite decode failed");
                    return;
                }
            };
            let small = image::imageops::resize(&img.to_rgba8(), THUMB_W, THUMB_H, FilterType::Lanczos3);
            let mut pixels = Vec::with_capacity((THUMB_W * THUMB_H * 3) as usize);
            for p in small.pixels() {
                pixels.extend_from_slice(&[p[0], p[1], p[2]]);
            }
            let thumb = SpriteThumb {
                w: THUMB_W,
                h: THUMB_H,
                pixels,
            };
            cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(id, Some(thumb));
        });
    }

    /// Pixel rows of the cached thumbnail for `id`, resized to `w` x `h`.
    pub fn sprite_pixels(&self, id: u32, w: u32, h: u32) -> Option<Vec<Vec<(u8, u8, u8)>>> {
        let cache = self.sprite_cache.lock().unwrap_or_else(PoisonError::into_inner);
        let thumb = cache.get(&id)?.as_ref()?;

        if thumb.w == w && thumb.h == h {
            return Some(
                thumb
                    .pixels
                    .chunks(3 * w as usize)
                    .map(|row| row.chunks(3).map(|px| (px[0], px[1], px[2])).collect())
                    .collect(),
            );
        }

        // Build an RGBA buffer from the thumbnail (opaque alpha) and resize in memory.
        let mut buf = image::RgbaImage::new(thumb.w, thumb.h);
        for y in 0..thumb.h {
            for x in 0..thumb.w {
                let idx = ((y * thumb.w + x) * 3) as usize;
                buf.put_pixel(
                    x,
                    y,
                    image::Rgba([thumb.pixels[idx], thumb.pixels[idx + 1], thumb.pixels[idx + 2], 255]),
                );
            }
        }
        let resized = image::imageops::resize(&buf, w, h, FilterType::Lanczos3);
        let mut rows: Vec<Vec<(u8, u8, u8)>> = Vec::with_capacity(resized.height() as usize);
        for y in 0..resized.height() {
            let mut row = Vec::with_capacity(resized.width() as usize);
            for x in 0..resized.width() {
                let p = resized.get_pixel(x, y);
                row.push((p[0], p[1], p[2]));
            }
            rows.push(row);
        }
        Some(rows)
    }
}

// helper to compute a centered rect for popups
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_w = r.width.saturating_mul(percent_x) / 100;
    let popup_h = r.height.saturating_mul(percent_y) / 100;
    let popup_x = r.x + (r.width.saturating_sub(popup_w) / 2);
    let popup_y = r.y + (r.height.saturating_sub(popup_h) / 2);
    Rect::new(popup_x, popup_y, popup_w, popup_h)
}

fn search_box(app: &App) -> Paragraph<'static> {
    let text = if app.search_mode {
        format!("/{}", app.search_query)
    } else {
        "Press '/' to search. Type to filter by name or type.".to_string()
    };
    Paragraph::new(vec![Spans::from(Span::raw(text))])
        .block(Block::default().borders(Borders::ALL).title("Search"))
}

fn type_badges(labels: &[String]) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    for (i, t) in labels.iter().enumerate() {
        let (r, g, b) = type_color(t);
        let fg = if is_light((r, g, b)) { Color::Black } else { Color::White };
        spans.push(Span::styled(
            format!(" {} ", format_name(t)),
            Style::default().fg(fg).bg(Color::Rgb(r, g, b)),
        ));
        if i + 1 < labels.len() {
            spans.push(Span::raw(" "));
        }
    }
    spans
}

fn heading(text: String) -> Spans<'static> {
    Spans::from(Span::styled(text, Style::default().add_modifier(Modifier::BOLD)))
}

fn entry_names(entries: &[crate::models::IndexEntry], max: usize) -> String {
    let mut names: Vec<String> = entries.iter().take(max).map(|e| format_name(&e.name)).collect();
    if entries.len() > max {
        names.push(format!("… (+{})", entries.len() - max));
    }
    names.join(", ")
}

fn draw_pokemon<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect, p: &Pokemon, group: Option<&str>) {
    let detail_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(12), Constraint::Min(6)])
        .split(area);
    let top_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(24), Constraint::Min(10)])
        .split(detail_chunks[0]);

    let sprite_para = if app.show_sprites {
        let rect = top_chunks[0];
        let sprite_w = (rect.width.saturating_sub(2).max(1) as u32).min(64);
        let sprite_h = (rect.height.saturating_sub(2).max(1) as u32).min(64);
        app.request_sprite(p);
        if let Some(sprite_lines) = app.sprite_pixels(p.id, sprite_w, sprite_h) {
            let stext: Vec<Spans> = sprite_lines
                .iter()
                .map(|row| {
                    Spans::from(
                        row.iter()
                            .map(|&(r, g, b)| Span::styled(" ", Style::default().bg(Color::Rgb(r, g, b))))
                            .collect::<Vec<_>>(),
                    )
                })
                .collect();
            Paragraph::new(stext).block(Block::default().borders(Borders::ALL).title("Sprite"))
        } else {
            Paragraph::new("(no sprite)").block(Block::default().borders(Borders::ALL).title("Sprite"))
        }
    } else {
        Paragraph::new("(sprites off)").block(Block::default().borders(Borders::ALL).title("Sprite"))
    };
    f.render_widget(sprite_para, top_chunks[0]);

    let mut info_lines: Vec<Spans> = vec![heading(format!("{} (#{})", format_name(&p.name), p.id))];
    let mut type_spans = vec![Span::raw("Types: ")];
    type_spans.extend(type_badges(&p.types));
    info_lines.push(Spans::from(type_spans));
    if let Some(group) = group {
        info_lines.push(Spans::from(Span::raw(format!("Species: {}", format_name(group)))));
    }
    if !p.abilities.is_empty() {
        info_lines.push(Spans::from(Span::raw(format!(
            "Abilities: {}",
            p.abilities.iter().map(|a| format_name(a)).collect::<Vec<_>>().join(", ")
        ))));
    }
    info_lines.push(Spans::from(Span::raw(format!(
        "Height: {}  Weight: {}  Base EXP: {}",
        p.height, p.weight, p.base_experience
    ))));
    if !p.is_default {
        info_lines.push(Spans::from(Span::raw("Alternate form")));
    }
    let info_para = Paragraph::new(info_lines)
        .block(Block::default().borders(Borders::ALL).title("Info"))
        .wrap(Wrap { trim: true });
    f.render_widget(info_para, top_chunks[1]);

    // Per-stat bars: NAME (padded) | VALUE | [bar...], scaled to the 255 stat cap.
    let stats_rect = detail_chunks[1];
    let inner_w = stats_rect.width.saturating_sub(2).max(1) as usize;
    let name_w = 10usize;
    let val_w = 4usize;
    let bar_max_w = inner_w.saturating_sub(name_w + val_w + 2);
    let scale_max = 255.0f32;

    let stat_lines: Vec<Spans> = p
        .stats
        .iter()
        .map(|st| {
            let bar_len = (((st.base as f32) / scale_max).min(1.0) * (bar_max_w as f32)).round() as usize;
            Spans::from(Span::raw(format!(
                "{:<name_w$} {:>val_w$} {}",
                stat_abbrev(&st.name),
                st.base,
                "█".repeat(bar_len),
                name_w = name_w,
                val_w = val_w
            )))
        })
        .collect();
    let stats_para = Paragraph::new(stat_lines).block(Block::default().borders(Borders::ALL).title("Stats"));
    f.render_widget(stats_para, stats_rect);
}

fn detail_lines(detail: &Detail, width: usize) -> Vec<Spans<'static>> {
    let mut lines = Vec::new();
    match detail {
        Detail::Location(l) => {
            lines.push(heading(format!("{} (#{})", format_name(&l.name), l.id)));
            if let Some(region) = &l.region {
                lines.push(Spans::from(Span::raw(format!("Region: {}", format_name(&region.name)))));
            }
            lines.push(Spans::from(Span::raw(format!("Areas ({}):", l.areas.len()))));
            for line in text_to_lines(&entry_names(&l.areas, 30), width) {
                lines.push(Spans::from(Span::raw(line)));
            }
        }
        Detail::Move(m) => {
            lines.push(heading(format!("{} (#{})", format_name(&m.name), m.id)));
            if let Some(t) = &m.move_type {
                let mut spans = vec![Span::raw("Type: ")];
                spans.extend(type_badges(std::slice::from_ref(&t.name)));
                lines.push(Spans::from(spans));
            }
            if let Some(class) = &m.damage_class {
                lines.push(Spans::from(Span::raw(format!("Class: {}", format_name(&class.name)))));
            }
            let show = |v: Option<u32>| v.map_or_else(|| "-".to_string(), |v| v.to_string());
            lines.push(Spans::from(Span::raw(format!(
                "Power: {}  Accuracy: {}  PP: {}  Priority: {}",
                show(m.power),
                show(m.accuracy),
                show(m.pp),
                m.priority
            ))));
        }
        Detail::Generation(g) => {
            lines.push(heading(format!("{} (#{})", format_name(&g.name), g.id)));
            if let Some(region) = &g.main_region {
                lines.push(Spans::from(Span::raw(format!("Main region: {}", format_name(&region.name)))));
            }
            lines.push(Spans::from(Span::raw(format!(
                "Species introduced: {}  Moves introduced: {}",
                g.pokemon_species.len(),
                g.moves.len()
            ))));
            for line in text_to_lines(&entry_names(&g.pokemon_species, 40), width) {
                lines.push(Spans::from(Span::raw(line)));
            }
        }
        Detail::Pokemon { .. } => {}
    }
    lines
}

pub fn draw_ui(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> io::Result<()> {
    app.apply_filter();
    let page_size = app.page_size;
    let rows = app.pane().rows(page_size);
    let detail = app.pane().detail();
    let status = app.pane().status();

    terminal
        .draw(|f| {
            let size = f.size();
            let outer = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(5)])
                .split(size);

            let titles: Vec<Spans> = app.panes.iter().map(|p| Spans::from(p.title())).collect();
            let tabs = Tabs::new(titles)
                .select(app.active)
                .block(Block::default().borders(Borders::ALL).title("Catalog"))
                .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
            f.render_widget(tabs, outer[0]);

            let chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
                .split(outer[1]);
            let left_chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(3), Constraint::Length(3)])
                .split(chunks[0]);

            let items: Vec<ListItem> = rows
                .rows
                .iter()
                .map(|r| ListItem::new(Spans::from(Span::raw(r.clone()))))
                .collect();
            let list_title = format!(
                "{} | page {}/{} ({} shown)",
                app.pane().title(),
                rows.page + 1,
                rows.page_count,
                rows.matched
            );
            let list = List::new(items)
                .block(Block::default().borders(Borders::ALL).title(list_title))
                .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
            let mut state = ListState::default();
            state.select(rows.selected);
            f.render_stateful_widget(list, left_chunks[0], &mut state);

            if status.loading && !app.search_mode {
                let gauge = Gauge::default()
                    .block(Block::default().borders(Borders::ALL).title(status.label.clone()))
                    .gauge_style(Style::default().fg(Color::Green))
                    .ratio(status.ratio);
                f.render_widget(gauge, left_chunks[1]);
            } else {
                f.render_widget(search_box(app), left_chunks[1]);
            }

            if let Some(err) = &status.error {
                let para = Paragraph::new(vec![
                    heading("Could not load this listing".to_string()),
                    Spans::from(Span::raw(err.clone())),
                    Spans::from(Span::raw("")),
                    Spans::from(Span::raw("Press 'r' to try again.")),
                ])
                .block(Block::default().borders(Borders::ALL).title("Error"))
                .wrap(Wrap { trim: true });
                f.render_widget(para, chunks[1]);
            } else {
                match &detail {
                    Some(Detail::Pokemon { pokemon, group }) => {
                        draw_pokemon(f, app, chunks[1], pokemon, group.as_deref());
                    }
                    Some(other) => {
                        let width = chunks[1].width.saturating_sub(4).max(20) as usize;
                        let para = Paragraph::new(detail_lines(other, width))
                            .block(Block::default().borders(Borders::ALL).title("Details"))
                            .wrap(Wrap { trim: true });
                        f.render_widget(para, chunks[1]);
                    }
                    None => {
                        let msg = if status.loading {
                            "Loading…"
                        } else {
                            "Nothing matches the filter"
                        };
                        f.render_widget(
                            Paragraph::new(msg).block(Block::default().borders(Borders::ALL).title("Details")),
                            chunks[1],
                        );
                    }
                }
            }

            // If help is requested, draw a centered help modal on top
            if app.show_help {
                let popup = centered_rect(60, 50, size);
                let help_lines: Vec<Spans> = vec![
                    heading("Keybindings".to_string()),
                    Spans::from(Span::raw("")),
                    Spans::from(Span::raw("q          Quit")),
                    Spans::from(Span::raw("/          Enter search mode")),
                    Spans::from(Span::raw("Enter/Esc  Finish or cancel search mode")),
                    Spans::from(Span::raw("Up/Down    Navigate list")),
                    Spans::from(Span::raw("n/p        Next / previous page")),
                    Spans::from(Span::raw("Tab        Switch listing")),
                    Spans::from(Span::raw("r          Reload the current listing")),
                    Spans::from(Span::raw("s          Toggle sprites")),
                    Spans::from(Span::raw("h/F1       Toggle this help modal")),
                ];
                let help_para = Paragraph::new(help_lines)
                    .block(Block::default().borders(Borders::ALL).title("Help"))
                    .wrap(Wrap { trim: true });
                f.render_widget(ratatui::widgets::Clear, popup);
                f.render_widget(help_para, popup);
            }
        })
        .map(|_| ())
}
