//! Session - Chat transcript with simulated reply latency

use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::info;

use super::responder::{self, CopilotContext, MessageKind};
use super::{ChatMessage, MessageRole};

/// Simulated latency before an assistant reply lands
pub const REPLY_DELAY: Duration = Duration::from_millis(1500);

struct PendingReply {
    seq: u64,
    content: String,
    kind: MessageKind,
}

/// One chat session bound to a patient context
pub struct CopilotSession {
    ctx: CopilotContext,
    messages: Vec<ChatMessage>,
    next_id: u64,
    send_seq: u64,
    delivered: u64,
    inbox: Vec<PendingReply>,
    in_flight: usize,
    reply_tx: UnboundedSender<PendingReply>,
    reply_rx: UnboundedReceiver<PendingReply>,
}

impl CopilotSession {
    /// Open a session, seeded with the assistant's greeting
    pub fn new(ctx: CopilotContext, clinician: &str) -> Self {
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        let mut session = Self {
            ctx,
            messages: Vec::new(),
            next_id: 1,
            send_seq: 0,
            delivered: 0,
            inbox: Vec::new(),
            in_flight: 0,
            reply_tx,
            reply_rx,
        };
        let greeting = responder::greeting(&session.ctx, clinician);
        session.append(MessageRole::Assistant, greeting, Some(MessageKind::Info));
        session
    }

    fn append(&mut self, role: MessageRole, content: String, kind: Option<MessageKind>) {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(ChatMessage {
            id,
            role,
            content,
            timestamp: Utc::now(),
            kind,
        });
    }

    /// Append the user message and schedule the scripted reply.
    /// Blank input is ignored. A second send while a reply is pending
    /// queues behind it, replies land in send order.
    pub fn send(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        self.append(MessageRole::User, text.to_string(), None);

        let reply = responder::template_for(text, &self.ctx);
        self.in_flight += 1;
        self.send_seq += 1;
        let seq = self.send_seq;
        let tx = self.reply_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(REPLY_DELAY).await;
            // A dropped receiver just means the session is gone
            let _ = tx.send(PendingReply {
                seq,
                content: reply.content,
                kind: reply.kind,
            });
        });
    }

    /// Move arrived replies into the transcript in send order,
    /// returning how many landed
    pub fn poll_replies(&mut self) -> usize {
        while let Ok(reply) = self.reply_rx.try_recv() {
            self.inbox.push(reply);
        }
        self.inbox.sort_by_key(|r| r.seq);

        let mut arrived = 0;
        // A reply holds here until every earlier one has landed
        while self.inbox.first().is_some_and(|r| r.seq == self.delivered + 1) {
            let reply = self.inbox.remove(0);
            self.delivered = reply.seq;
            self.in_flight = self.in_flight.saturating_sub(1);
            self.append(MessageRole::Assistant, reply.content, Some(reply.kind));
            arrived += 1;
        }
        if arrived > 0 {
            info!("{arrived} copilot replies delivered");
        }
        arrived
    }

    /// True while any reply is still on its timer
    pub fn is_typing(&self) -> bool {
        self.in_flight > 0
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn patient_name(&self) -> &str {
        &self.ctx.patient.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercises;
    use crate::patients::builtin_patients;

    fn fixture_session() -> CopilotSession {
        let patient = builtin_patients()[0].clone();
        let ctx = CopilotContext {
            patient,
            library: exercises::builtin_library(),
        };
        CopilotSession::new(ctx, "Dr. Chen")
    }

    #[tokio::test(start_paused = true)]
    async fn test_greeting_seeded() {
        let session = fixture_session();

        assert_eq!(session.messages().len(), 1);
        let greeting = &session.messages()[0];
        assert_eq!(greeting.role, MessageRole::Assistant);
        assert_eq!(greeting.kind, Some(MessageKind::Info));
        assert!(greeting.content.starts_with("Bonjour Dr. Chen!"));
        assert!(!session.is_typing());
        assert_eq!(session.patient_name(), "Marie Dubois");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reply_lands_after_delay() {
        let mut session = fixture_session();
        session.send("Vérifier les contre-indications");

        assert_eq!(session.messages().len(), 2, "User message appends at once");
        assert_eq!(session.messages()[1].role, MessageRole::User);
        assert!(session.is_typing());
        assert_eq!(session.poll_replies(), 0, "Nothing lands before the delay");

        tokio::time::sleep(Duration::from_millis(1600)).await;
        assert_eq!(session.poll_replies(), 1);
        assert!(!session.is_typing());

        let reply = session.messages().last().unwrap();
        assert_eq!(reply.role, MessageRole::Assistant);
        assert_eq!(reply.kind, Some(MessageKind::Warning));
        assert!(reply.content.contains("À Éviter"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_sends_keep_order() {
        let mut session = fixture_session();
        session.send("Vérifier les contre-indications");
        tokio::time::sleep(Duration::from_millis(100)).await;
        session.send("Pourquoi l'amplitude stagne-t-elle?");

        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(session.poll_replies(), 2);

        let roles: Vec<MessageRole> = session.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::Assistant,
                MessageRole::User,
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::Assistant,
            ]
        );
        assert!(
            session.messages()[3].content.contains("À Éviter"),
            "First question answered first"
        );
        assert!(session.messages()[4].content.contains("Causes Profondes"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shuffled_arrivals_keep_send_order() {
        let mut session = fixture_session();
        let pending = |seq: u64, content: &str| PendingReply {
            seq,
            content: content.to_string(),
            kind: MessageKind::Info,
        };

        // Two questions outstanding, the second timer finishes first
        session.send_seq = 2;
        session.in_flight = 2;
        session.reply_tx.send(pending(2, "deuxième réponse")).unwrap();
        assert_eq!(session.poll_replies(), 0, "Holds until the first lands");
        assert!(session.is_typing());

        session.reply_tx.send(pending(1, "première réponse")).unwrap();
        assert_eq!(session.poll_replies(), 2);
        assert!(!session.is_typing());

        let contents: Vec<&str> = session.messages()[1..]
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["première réponse", "deuxième réponse"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_send_ignored() {
        let mut session = fixture_session();
        session.send("   ");
        session.send("");

        assert_eq!(session.messages().len(), 1, "Only the greeting");
        assert!(!session.is_typing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_message_ids_ascend() {
        let mut session = fixture_session();
        session.send("Question A");
        tokio::time::sleep(Duration::from_millis(1600)).await;
        session.poll_replies();

        let ids: Vec<u64> = session.messages().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
