//! Development server with live reload

use anyhow::Result;
use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode, DebouncedEvent};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::services::ServeDir;

use crate::Blog;

const LIVE_RELOAD_PATH: &str = "/__livereload";

/// Live reload client, inserted before `</body>`
const LIVE_RELOAD_SCRIPT: &str = r#"<script>
(function () {
  var ws = new WebSocket('ws://' + location.host + '/__livereload');
  ws.onmessage = function (msg) {
    if (msg.data === 'reload') { location.reload(); }
  };
  ws.onclose = function () {
    setTimeout(function () { location.reload(); }, 1000);
  };
})();
</script>
</body>"#;

/// Shared server state
struct ServerState {
    public_dir: PathBuf,
    reload_tx: broadcast::Sender<()>,
    live_reload: bool,
}

/// Options of `taglog server`
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub ip: String,
    pub port: u16,
    /// Watch sources and push reloads
    pub watch: bool,
    /// Open the site in a browser
    pub open: bool,
}

impl ServerOptions {
    /// Local address the site is served at
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.ip, self.port)
    }
}

/// Generate the site for local preview, then serve it until interrupted
pub async fn start(blog: &Blog, options: &ServerOptions) -> Result<()> {
    let url = options.url();
    // Absolute links must point at the dev server
    let blog = blog.clone().with_site_url(url.clone());
    blog.generate()?;

    let (reload_tx, _) = broadcast::channel::<()>(16);
    let state = Arc::new(ServerState {
        public_dir: blog.public_dir.clone(),
        reload_tx: reload_tx.clone(),
        live_reload: options.watch,
    });

    let app = Router::new()
        .route(LIVE_RELOAD_PATH, get(livereload_handler))
        .fallback(fallback_handler)
        .with_state(state);

    let bind_ip = if options.ip == "localhost" {
        "127.0.0.1"
    } else {
        options.ip.as_str()
    };
    let addr: SocketAddr = format!("{}:{}", bind_ip, options.port).parse()?;

    println!("Server running at {}", url);
    if options.watch {
        println!("Live reload enabled. Watching for changes...");
    }
    println!("Press Ctrl+C to stop.");

    if options.open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    if options.watch {
        tokio::task::spawn_blocking(move || {
            if let Err(e) = watch_and_reload(&blog, reload_tx) {
                tracing::error!("File watcher error: {:#}", e);
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Regenerate on changes to contents or config and notify connected pages
fn watch_and_reload(blog: &Blog, reload_tx: broadcast::Sender<()>) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;

    let contents_dir = blog.base_dir.join(&blog.config.contents_dir);
    let config_path = blog.config_path();
    for (path, mode) in [
        (&contents_dir, RecursiveMode::Recursive),
        (&config_path, RecursiveMode::NonRecursive),
    ] {
        if path.exists() {
            debouncer.watcher().watch(path, mode)?;
            tracing::debug!("Watching: {:?}", path);
        }
    }

    for result in rx {
        let events = match result {
            Ok(events) => events,
            Err(e) => {
                tracing::error!("Watch error: {:?}", e);
                continue;
            }
        };

        let changed: Vec<&DebouncedEvent> =
            events.iter().filter(|e| is_relevant(&e.path)).collect();
        if changed.is_empty() {
            continue;
        }
        for event in &changed {
            tracing::info!("Changed: {}", event.path.display());
        }

        // Config edits take effect without restarting
        let rebuilt = Blog::new(&blog.base_dir).map(|fresh| {
            let mut fresh = fresh.with_site_url(blog.config.site_url.clone());
            fresh.include_drafts = blog.include_drafts;
            fresh
        });
        match rebuilt.and_then(|fresh| fresh.generate()) {
            Ok(()) => {
                tracing::info!("Regenerated");
                let _ = reload_tx.send(());
            }
            Err(e) => tracing::error!("Generation failed: {:#}", e),
        }
    }

    Ok(())
}

/// Skip editor swap files and VCS noise
fn is_relevant(path: &Path) -> bool {
    let path = path.to_string_lossy();
    !path.contains(".git")
        && !path.contains(".DS_Store")
        && !path.ends_with('~')
        && !path.ends_with(".swp")
}

async fn livereload_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    let reload_rx = state.reload_tx.subscribe();
    ws.on_upgrade(move |socket| handle_livereload_socket(socket, reload_rx))
}

async fn handle_livereload_socket(mut socket: WebSocket, mut reload_rx: broadcast::Receiver<()>) {
    tracing::debug!("Live reload client connected");

    loop {
        tokio::select! {
            result = reload_rx.recv() => {
                match result {
                    Ok(()) => {
                        if socket.send(Message::Text("reload".to_string())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }

    tracing::debug!("Live reload client disconnected");
}

/// Serve files from the public directory, injecting the reload script into HTML
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    let file_path = resolve(&state.public_dir, request.uri().path());
    let is_html = file_path
        .extension()
        .map(|ext| ext == "html" || ext == "htm")
        .unwrap_or(false);

    if !is_html {
        let mut service = ServeDir::new(&state.public_dir).append_index_html_on_directories(true);
        return match service.try_call(request).await {
            Ok(response) => response.into_response(),
            Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
        };
    }

    let (status, content) = match tokio::fs::read_to_string(&file_path).await {
        Ok(content) => (StatusCode::OK, content),
        Err(_) => match tokio::fs::read_to_string(state.public_dir.join("404.html")).await {
            Ok(content) => (StatusCode::NOT_FOUND, content),
            Err(_) => return (StatusCode::NOT_FOUND, "Not found").into_response(),
        },
    };

    let body = if state.live_reload {
        inject_live_reload(&content)
    } else {
        content
    };
    (status, Html(body)).into_response()
}

/// Map a request path to a file, preferring `index.html` for directories
fn resolve(public_dir: &Path, path: &str) -> PathBuf {
    let clean_path = path.trim_start_matches('/');
    let candidate = public_dir.join(clean_path);

    if clean_path.is_empty() || candidate.is_dir() {
        candidate.join("index.html")
    } else if candidate.exists() {
        candidate
    } else if candidate.extension().is_none() {
        // `/about` serves `/about/index.html`
        candidate.join("index.html")
    } else {
        candidate
    }
}

fn inject_live_reload(html: &str) -> String {
    match html.rfind("</body>") {
        Some(pos) => format!("{}{}{}", &html[..pos], LIVE_RELOAD_SCRIPT, &html[pos + 7..]),
        None => format!("{}{}", html, LIVE_RELOAD_SCRIPT),
    }
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_inject_live_reload_before_last_body() {
        let html = "<html><body><p>x</p></body></html>";
        let out = inject_live_reload(html);
        assert!(out.contains("/__livereload"));
        assert!(out.ends_with("</body></html>"));
        assert_eq!(out.matches("</body>").count(), 1);

        let bare = inject_live_reload("<p>x</p>");
        assert!(bare.starts_with("<p>x</p><script>"));
    }

    #[test]
    fn test_resolve_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("about")).unwrap();
        fs::write(dir.path().join("about/index.html"), "").unwrap();
        fs::write(dir.path().join("404.html"), "").unwrap();

        assert_eq!(resolve(dir.path(), "/"), dir.path().join("index.html"));
        assert_eq!(resolve(dir.path(), "/about/"), dir.path().join("about/index.html"));
        assert_eq!(resolve(dir.path(), "/about"), dir.path().join("about/index.html"));
        assert_eq!(resolve(dir.path(), "/missing"), dir.path().join("missing/index.html"));
        assert_eq!(resolve(dir.path(), "/404.html"), dir.path().join("404.html"));
        assert_eq!(resolve(dir.path(), "/css/a.css"), dir.path().join("css/a.css"));
    }

    #[test]
    fn test_options_url_and_relevant_paths() {
        let options = ServerOptions {
            ip: "localhost".to_string(),
            port: 4000,
            watch: true,
            open: false,
        };
        assert_eq!(options.url(), "http://localhost:4000");
        assert!(is_relevant(Path::new("contents/posts/a.md")));
        assert!(!is_relevant(Path::new("contents/posts/.a.md.swp")));
        assert!(!is_relevant(Path::new(".git/index")));
    }
}
