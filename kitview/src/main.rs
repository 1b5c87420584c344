mod action;
mod effect;
mod procgen;
mod reducer;
mod state;
mod ui;

use std::collections::VecDeque;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend, layout::Rect};
use tui_dispatch::EffectStore;
use tui_gamekit::aseprite::{AnimatedSprite, SheetOptions, SpriteSheet};
use tui_gamekit::parse::IndexParseOptions;
use tui_gamekit::tilemap::{TileOrder, Tilemap, Tileset};

use crate::action::Action;
use crate::effect::Effect;
use crate::state::{AppState, GeneratorKind, tileset_preview};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Parser, Debug)]
#[command(name = "kitview")]
#[command(about = "Browse generated maps, tilesets and Aseprite animations in the terminal")]
struct Args {
    #[arg(long, value_enum, default_value_t = GeneratorKind::DrunkWalk)]
    generator: GeneratorKind,
    #[arg(long, default_value_t = 0xC0FF_EE_u64)]
    seed: u64,
    /// Generated map width in tiles.
    #[arg(long, default_value_t = 80)]
    width: u16,
    /// Generated map height in tiles.
    #[arg(long, default_value_t = 50)]
    height: u16,
    /// Aseprite JSON export (hash or array layout).
    #[arg(long)]
    sprite_json: Option<PathBuf>,
    /// Sheet image; defaults to `meta.image` next to the JSON.
    #[arg(long, requires = "sprite_json")]
    sprite_image: Option<PathBuf>,
    /// Initial animation tag.
    #[arg(long, requires = "sprite_json")]
    animation: Option<String>,
    /// Tileset image cut into square tiles.
    #[arg(long)]
    tileset: Option<PathBuf>,
    #[arg(long, default_value_t = 16)]
    tile_size: u32,
    /// Number tileset tiles from the bottom row up.
    #[arg(long, requires = "tileset")]
    tiles_bottom_up: bool,
    /// Text file of tile indices; without it every tile is shown once.
    #[arg(long, requires = "tileset")]
    map_data: Option<PathBuf>,
    /// Write logs here; the terminal is busy with the UI.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> io::Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    let mut state = AppState::new(args.seed, args.generator, args.width, args.height);
    state.sprite = load_sprite(&args)?;
    state.tilemap = load_tilemap(&args)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, state);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn init_logging(path: Option<&Path>) -> io::Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn load_sprite(args: &Args) -> io::Result<Option<AnimatedSprite>> {
    let Some(json_path) = &args.sprite_json else {
        return Ok(None);
    };
    let image_path = match &args.sprite_image {
        Some(path) => path.clone(),
        None => {
            let sheet = SpriteSheet::open(json_path, SheetOptions::default()).map_err(io::Error::other)?;
            json_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(&sheet.meta().image)
        }
    };

    let sheet = SpriteSheet::load(&image_path, json_path, SheetOptions::default())
        .map_err(io::Error::other)?;
    log::info!(
        "loaded sprite sheet {}: animations {:?}",
        json_path.display(),
        sheet.available_animations()
    );
    let sprite = AnimatedSprite::new(Arc::new(sheet), args.animation.as_deref(), None)
        .map_err(io::Error::other)?;
    Ok(Some(sprite))
}

fn load_tilemap(args: &Args) -> io::Result<Option<Tilemap>> {
    let Some(tileset_path) = &args.tileset else {
        return Ok(None);
    };
    let order = if args.tiles_bottom_up {
        TileOrder::BottomUp
    } else {
        TileOrder::TopDown
    };
    let tileset = Tileset::open_ordered(tileset_path, args.tile_size, args.tile_size, order)
        .map_err(io::Error::other)?;
    let tilemap = match &args.map_data {
        Some(path) => Tilemap::with_data_file(tileset, path, &IndexParseOptions::default())
            .map_err(io::Error::other)?,
        None => {
            let preview = tileset_preview(tileset.len());
            Tilemap::new(tileset, preview)
        }
    };
    log::info!(
        "loaded tileset {} ({} tiles)",
        tileset_path.display(),
        tilemap.tileset().len()
    );
    Ok(Some(tilemap))
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, state: AppState) -> io::Result<()> {
    let mut store = EffectStore::new(state, reducer::reducer);
    dispatch_action(&mut store, Action::Init);
    let mut last_tick = Instant::now();

    loop {
        let size = terminal.size()?;
        let view = ui::map_area(Rect::new(0, 0, size.width, size.height));
        if view != store.state().view_area {
            dispatch_action(
                &mut store,
                Action::ViewResize {
                    x: view.x,
                    y: view.y,
                    width: view.width,
                    height: view.height,
                },
            );
        }

        terminal.draw(|frame| ui::render(frame, frame.area(), store.state()))?;

        if event::poll(POLL_INTERVAL)? {
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => {
                    if handle_key(key.code, &mut store) {
                        break;
                    }
                }
                Event::Mouse(mouse) => handle_mouse(mouse, &mut store),
                _ => {}
            }
        }

        let now = Instant::now();
        let elapsed = now.duration_since(last_tick).as_millis().min(u32::MAX as u128) as u32;
        last_tick = now;
        dispatch_action(&mut store, Action::Tick(elapsed));
    }

    Ok(())
}

fn handle_key(code: KeyCode, store: &mut EffectStore<AppState, Action, Effect>) -> bool {
    let action = match code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return true,
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Action::ViewPan { dx: 0, dy: -1 },
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Action::ViewPan { dx: 0, dy: 1 },
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Action::ViewPan { dx: -1, dy: 0 },
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Action::ViewPan { dx: 1, dy: 0 },
        KeyCode::Char('+') | KeyCode::Char('=') => Action::ViewZoom { at: None, steps: -1 },
        KeyCode::Char('-') | KeyCode::Char('_') => Action::ViewZoom { at: None, steps: 1 },
        KeyCode::Char('g') | KeyCode::Char('G') => Action::NextGenerator,
        KeyCode::Char('r') | KeyCode::Char('R') => Action::Reseed,
        KeyCode::Char('n') | KeyCode::Char('N') => Action::NextAnimation,
        KeyCode::Char('t') | KeyCode::Char('T') => Action::ToggleLayer,
        KeyCode::Char('c') | KeyCode::Char('C') => Action::ViewCenter,
        _ => return false,
    };
    dispatch_action(store, action);
    false
}

fn handle_mouse(mouse: MouseEvent, store: &mut EffectStore<AppState, Action, Effect>) {
    let at = (mouse.column, mouse.row);
    let action = match mouse.kind {
        MouseEventKind::ScrollUp => Action::ViewZoom {
            at: Some(at),
            steps: -1,
        },
        MouseEventKind::ScrollDown => Action::ViewZoom {
            at: Some(at),
            steps: 1,
        },
        MouseEventKind::Down(MouseButton::Left) => Action::DragStart {
            column: mouse.column,
            row: mouse.row,
        },
        MouseEventKind::Drag(MouseButton::Left) => Action::DragMove {
            column: mouse.column,
            row: mouse.row,
        },
        MouseEventKind::Up(MouseButton::Left) => Action::DragEnd,
        _ => return,
    };
    dispatch_action(store, action);
}

fn dispatch_action(store: &mut EffectStore<AppState, Action, Effect>, action: Action) {
    let mut queue = VecDeque::from([action]);

    while let Some(next_action) = queue.pop_front() {
        let result = store.dispatch(next_action);
        for effect in result.effects {
            handle_effect(effect, &mut queue);
        }
    }
}

fn handle_effect(effect: Effect, queue: &mut VecDeque<Action>) {
    match effect {
        Effect::GenerateMap {
            generator,
            seed,
            width,
            height,
        } => match procgen::generate_level(generator, seed, width, height) {
            Ok(level) => queue.push_back(Action::MapGenerated(level)),
            Err(err) => {
                log::error!("map generation failed: {err}");
                queue.push_back(Action::GenerationFailed(err.to_string()));
            }
        },
    }
}
