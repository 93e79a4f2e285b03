use crate::services::common::Property;
use crate::services::media_player::{PlayerView, QueueSnapshot};

use super::estimator::{Progress, format_time};
use super::notice::Notice;

/// One row of the queue popup
#[derive(Debug, Clone, PartialEq)]
pub enum QueueRow {
    /// A queue entry
    Track {
        /// 0-based queue index
        index: usize,
        /// Title
        title: String,
        /// Artist
        artist: String,
        /// Album
        album: String,
        /// Formatted duration, empty when unknown
        duration: String,
        /// Whether this is the entry under the cursor
        current: bool,
    },
    /// Shown when no queue could be read
    Placeholder(String),
}

/// Queue popup contents.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueuePopup {
    /// Whether the popup is open
    pub visible: bool,
    /// Popup title
    pub title: String,
    /// Rows
    pub rows: Vec<QueueRow>,
}

impl QueuePopup {
    /// Rows for `queue`, marking the entry at the 1-based cursor.
    pub fn rows_for(queue: &QueueSnapshot, queue_position: Option<u32>) -> Vec<QueueRow> {
        queue
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| QueueRow::Track {
                index,
                title: item.title.clone(),
                artist: item.artist.clone(),
                album: item.album.clone(),
                duration: item.duration.map(format_time).unwrap_or_default(),
                current: is_cursor(index, queue_position),
            })
            .collect()
    }

    /// Re-mark the current entry after the cursor moved.
    pub fn mark_current(&mut self, queue_position: Option<u32>) -> bool {
        let mut changed = false;
        for row in &mut self.rows {
            if let QueueRow::Track { index, current, .. } = row {
                let now_current = is_cursor(*index, queue_position);
                if *current != now_current {
                    *current = now_current;
                    changed = true;
                }
            }
        }
        changed
    }

    /// Index of the current entry, if marked.
    pub fn current_index(&self) -> Option<usize> {
        self.rows.iter().find_map(|row| match row {
            QueueRow::Track {
                index,
                current: true,
                ..
            } => Some(*index),
            _ => None,
        })
    }
}

fn is_cursor(index: usize, queue_position: Option<u32>) -> bool {
    queue_position.and_then(crate::services::media_player::types::cursor_index) == Some(index)
}

/// Everything the rendering layer reads.
///
/// Values are only written by the card's operations.
#[derive(Debug, Clone)]
pub struct CardView {
    /// Optional card header
    pub header: Option<String>,
    /// Now-playing view
    pub player: Property<PlayerView>,
    /// Progress bar and time labels
    pub progress: Property<Progress>,
    /// Whether a seek command is in flight
    pub seeking: Property<bool>,
    /// Error or unavailable notice
    pub notice: Property<Option<Notice>>,
    /// Queue popup
    pub queue: Property<QueuePopup>,
}

impl CardView {
    pub(crate) fn new(header: Option<String>) -> Self {
        Self {
            header,
            player: Property::new(PlayerView::Loading),
            progress: Property::new(Progress::new(0.0, None)),
            seeking: Property::new(false),
            notice: Property::new(None),
            queue: Property::new(QueuePopup::default()),
        }
    }
}
