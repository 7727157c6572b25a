//! Generic `{"event": "<name>"}` channel shared by every producer.

use crate::state::reconciler::reject_unknown;
use crate::state::Event;
use crate::vitals::Payload;

/// Parses a named event. Unknown or missing names are logged and yield `None`.
pub fn parse_event(payload: &Payload) -> Option<Event> {
    let Some(name) = payload.first_text(&["event", "type"]) else {
        reject_unknown("<missing>");
        return None;
    };
    let image = payload.first_text(&["image", "image_path"]);

    let event = Event::from_name(&name, image);
    if event.is_none() {
        reject_unknown(&name);
    }
    event
}
