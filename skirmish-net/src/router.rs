//! Projection routing for inbound messages.

use crate::projection::GameProjection;
use crate::protocol::ServerMessage;

/// Apply `message` to the projection.
///
/// Each tag in the closed set maps to exactly one projection operation.
/// Returns `false` for [`ServerMessage::Unknown`], which is left to
/// subscribers.
pub fn route(message: &ServerMessage, projection: &mut dyn GameProjection) -> bool {
    match message {
        ServerMessage::TickState(snapshot) => projection.apply_tick(snapshot.clone()),
        ServerMessage::Events { events } => projection.append_events(events.clone()),
        ServerMessage::Announcement { text } => projection.push_announcement(text.clone()),
        ServerMessage::Error { code, message } => {
            log::warn!("Server error {code}: {message}");
            projection.push_announcement(format!("Error: {message}"));
        }
        ServerMessage::GameOver { winner, stats } => {
            log::info!("Game over, winner: {}", winner.as_deref().unwrap_or("none"));
            projection.finish_game(winner.clone(), stats.clone());
        }
        ServerMessage::Unknown => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::GameView;
    use crate::protocol::InboundMessage;

    fn route_text(view: &mut GameView, text: &str) -> bool {
        let inbound = InboundMessage::parse(text).unwrap();
        route(&inbound.message, view)
    }

    #[test]
    fn test_each_tag_hits_one_operation() {
        let mut view = GameView::new();

        assert!(route_text(&mut view, r#"{"type":"tick_state","tick":3,"full":true}"#));
        assert_eq!(view.tick(), Some(3));
        assert!(view.events.is_empty() && view.announcements.is_empty());

        assert!(route_text(&mut view, r#"{"type":"events","events":[{"kind":"kill"},{"kind":"tower"}]}"#));
        assert_eq!(view.events.len(), 2);

        assert!(route_text(&mut view, r#"{"type":"announcement","text":"First blood"}"#));
        assert_eq!(view.announcements, vec!["First blood".to_string()]);

        assert!(route_text(&mut view, r#"{"type":"game_over","winner":"red","stats":{}}"#));
        assert_eq!(view.result.as_ref().unwrap().winner.as_deref(), Some("red"));
    }

    #[test]
    fn test_error_becomes_announcement() {
        let mut view = GameView::new();
        assert!(route_text(&mut view, r#"{"type":"error","code":"E1","message":"slow down"}"#));
        assert_eq!(view.announcements, vec!["Error: slow down".to_string()]);
        assert!(view.result.is_none());
    }

    #[test]
    fn test_unknown_tag_leaves_projection_untouched() {
        let mut view = GameView::new();
        assert!(!route_text(&mut view, r#"{"type":"queue_update","playersInQueue":4}"#));
        assert!(view.snapshot.is_none());
        assert!(view.events.is_empty());
        assert!(view.announcements.is_empty());
    }
}
