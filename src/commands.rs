//! Command interface - what the editor UI calls into
//!
//! Sessions live in a [`SessionRegistry`] owned by the host; each command
//! addresses one session by id. Confirm and cancel remove the session.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::codec::{self, OutputFormat};
use crate::config::RedactConfig;
use crate::error::RedactError;
use crate::session::EditingSession;
use crate::stroke::ToolSettings;

/// Open sessions keyed by id
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, EditingSession>>,
    next_id: AtomicU64,
    config: RedactConfig,
}

impl SessionRegistry {
    pub fn new(config: RedactConfig) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            config,
        }
    }

    pub fn config(&self) -> &RedactConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    fn insert(&self, session: EditingSession) -> String {
        let id = format!("redact_{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        self.sessions.lock().insert(id.clone(), session);
        id
    }

    fn remove(&self, id: &str) -> Result<EditingSession, RedactError> {
        self.sessions
            .lock()
            .remove(id)
            .ok_or_else(|| RedactError::SessionNotFound(id.to_string()))
    }

    fn with_session<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut EditingSession) -> T,
    ) -> Result<T, RedactError> {
        let mut sessions = self.sessions.lock();
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| RedactError::SessionNotFound(id.to_string()))?;
        Ok(f(session))
    }
}

/// Session info returned after opening
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: String,
    pub width: u32,
    pub height: u32,
    pub tool: ToolSettings,
}

/// Session state after an edit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub action_count: usize,
    pub drawing: bool,
}

/// Confirmed result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedImage {
    pub data_url: String,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
}

fn state_of(session: &EditingSession) -> SessionState {
    SessionState {
        action_count: session.actions().len(),
        drawing: session.is_drawing(),
    }
}

/// Open a session from a `data:` URL
pub async fn open_session(
    registry: &SessionRegistry,
    image_data_url: String,
) -> Result<SessionInfo, String> {
    let session = EditingSession::open_data_url(&image_data_url, registry.config.clone())
        .await
        .map_err(|e| {
            tracing::warn!("Failed to open session: {}", e);
            e
        })?;

    let (width, height) = session.dimensions();
    let tool = session.tool();
    let id = registry.insert(session);
    tracing::info!("Session {} opened ({}x{})", id, width, height);

    Ok(SessionInfo {
        id,
        width,
        height,
        tool,
    })
}

pub fn set_display_rect(
    registry: &SessionRegistry,
    id: &str,
    left: f32,
    top: f32,
    width: f32,
    height: f32,
) -> Result<(), String> {
    Ok(registry.with_session(id, |s| s.set_display_rect(left, top, width, height))?)
}

pub fn set_tool(
    registry: &SessionRegistry,
    id: &str,
    tool: ToolSettings,
) -> Result<ToolSettings, String> {
    Ok(registry.with_session(id, |s| {
        s.set_tool(tool);
        s.tool()
    })?)
}

pub fn pointer_down(
    registry: &SessionRegistry,
    id: &str,
    x: f32,
    y: f32,
) -> Result<SessionState, String> {
    Ok(registry.with_session(id, |s| {
        s.pointer_down(x, y);
        state_of(s)
    })?)
}

pub fn pointer_move(
    registry: &SessionRegistry,
    id: &str,
    x: f32,
    y: f32,
) -> Result<SessionState, String> {
    Ok(registry.with_session(id, |s| {
        s.pointer_move(x, y);
        state_of(s)
    })?)
}

pub fn pointer_up(registry: &SessionRegistry, id: &str) -> Result<SessionState, String> {
    Ok(registry.with_session(id, |s| {
        s.pointer_up();
        state_of(s)
    })?)
}

pub fn pointer_leave(registry: &SessionRegistry, id: &str) -> Result<SessionState, String> {
    Ok(registry.with_session(id, |s| {
        s.pointer_leave();
        state_of(s)
    })?)
}

pub fn undo(registry: &SessionRegistry, id: &str) -> Result<SessionState, String> {
    Ok(registry.with_session(id, |s| {
        s.undo();
        state_of(s)
    })?)
}

pub fn clear_actions(registry: &SessionRegistry, id: &str) -> Result<SessionState, String> {
    Ok(registry.with_session(id, |s| {
        s.clear();
        state_of(s)
    })?)
}

/// Preview overlay as a PNG data URL.
///
/// Only the snapshot is taken under the registry lock; rasterizing and
/// encoding run after it is released.
pub fn preview_mask(registry: &SessionRegistry, id: &str) -> Result<String, String> {
    let snapshot = registry.with_session(id, |s| s.preview_snapshot())?;
    let preview = snapshot.render();
    Ok(codec::to_data_url(&preview, OutputFormat::Png)?)
}

/// Render the result, end the session and hand back the encoded image.
///
/// `file_name` is the original upload name, used to build the download name.
pub fn confirm_session(
    registry: &SessionRegistry,
    id: &str,
    file_name: &str,
) -> Result<ExportedImage, String> {
    let session = registry.remove(id)?;
    let rendered = session.confirm()?;

    Ok(ExportedImage {
        data_url: rendered.to_data_url()?,
        file_name: codec::output_file_name(file_name, rendered.format),
        width: rendered.image.width(),
        height: rendered.image.height(),
    })
}

/// End the session without output
pub fn cancel_session(registry: &SessionRegistry, id: &str) -> Result<(), String> {
    registry.remove(id)?.cancel();
    Ok(())
}
