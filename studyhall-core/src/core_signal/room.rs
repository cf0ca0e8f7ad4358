//! A single signaling room
//!
//! Members are kept in join order; broadcasts iterate that order, so within
//! one room delivery order matches join order.

use tokio::sync::mpsc;

use super::events::{ClientId, SignalEvent};

pub(crate) struct RoomMember {
    pub client: ClientId,
    /// Signaling identifier announced on join; subscribers to event rooms
    /// carry none and produce no leave broadcast
    pub peer_id: Option<String>,
    pub sender: mpsc::UnboundedSender<SignalEvent>,
}

#[derive(Default)]
pub(crate) struct Room {
    members: Vec<RoomMember>,
}

impl Room {
    /// Add a member; re-joins are ignored so a client occupies one slot
    pub fn join(&mut self, member: RoomMember) -> bool {
        if self.members.iter().any(|m| m.client == member.client) {
            return false;
        }
        self.members.push(member);
        true
    }

    pub fn contains(&self, client: ClientId) -> bool {
        self.members.iter().any(|m| m.client == client)
    }

    pub fn remove(&mut self, client: ClientId) -> Option<RoomMember> {
        let idx = self.members.iter().position(|m| m.client == client)?;
        Some(self.members.remove(idx))
    }

    /// Send `event` to every member except `except`, in join order.
    /// A closed receiver is skipped; its client is cleaned up on disconnect.
    pub fn broadcast_excluding(&self, except: ClientId, event: &SignalEvent) {
        for member in &self.members {
            if member.client == except {
                continue;
            }
            let _ = member.sender.send(event.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: u64, peer: Option<&str>) -> (RoomMember, mpsc::UnboundedReceiver<SignalEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            RoomMember {
                client: ClientId(id),
                peer_id: peer.map(str::to_string),
                sender: tx,
            },
            rx,
        )
    }

    #[test]
    fn test_rejoin_is_ignored() {
        let mut room = Room::default();
        let (a, _rx_a) = member(1, Some("peer-a"));
        let (a_again, _rx_a2) = member(1, Some("peer-a"));
        assert!(room.join(a));
        assert!(!room.join(a_again));
        assert_eq!(room.len(), 1);
    }

    #[test]
    fn test_broadcast_order_matches_join_order() {
        let mut room = Room::default();
        let (a, mut rx_a) = member(1, Some("peer-a"));
        let (b, mut rx_b) = member(2, Some("peer-b"));
        let (c, mut rx_c) = member(3, Some("peer-c"));
        room.join(a);
        room.join(b);
        room.join(c);

        let event = SignalEvent::ParticipantLeft {
            session_code: "Q7X2PL".to_string(),
            peer_id: "peer-d".to_string(),
        };
        room.broadcast_excluding(ClientId(2), &event);

        assert_eq!(rx_a.try_recv().unwrap(), event);
        assert!(rx_b.try_recv().is_err());
        assert_eq!(rx_c.try_recv().unwrap(), event);
    }

    #[test]
    fn test_closed_receiver_does_not_poison_broadcast() {
        let mut room = Room::default();
        let (a, rx_a) = member(1, Some("peer-a"));
        let (b, mut rx_b) = member(2, Some("peer-b"));
        room.join(a);
        room.join(b);
        drop(rx_a);

        let event = SignalEvent::ParticipantJoined {
            session_code: "Q7X2PL".to_string(),
            peer_id: "peer-c".to_string(),
        };
        room.broadcast_excluding(ClientId(99), &event);
        assert_eq!(rx_b.try_recv().unwrap(), event);
    }
}
