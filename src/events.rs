use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

/// Events emitted by the services after their transaction commits.
/// Consumers must tolerate loss; the channel is advisory, not durable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    MenuItemCreated(i64),
    TableCreated(i64),
    OrderCreated {
        order_id: i64,
        table_id: i64,
    },
    OrderLinesReplaced {
        order_id: i64,
        line_count: usize,
    },
    OrderStatusChanged {
        order_id: i64,
        old_status: String,
        new_status: String,
    },
    OrderClosed {
        order_id: i64,
        bill_id: i64,
        invoice_number: i64,
    },
    BillPrinted {
        bill_id: i64,
        transport: String,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains the event channel and writes each event to the log. Runs until
/// every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::MenuItemCreated(item_id) => {
                info!(item_id = %item_id, "Menu item created");
            }
            Event::TableCreated(table_id) => {
                info!(table_id = %table_id, "Table created");
            }
            Event::OrderCreated { order_id, table_id } => {
                info!(order_id = %order_id, table_id = %table_id, "Order created");
            }
            Event::OrderLinesReplaced {
                order_id,
                line_count,
            } => {
                info!(order_id = %order_id, line_count = %line_count, "Order lines replaced");
            }
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(
                    order_id = %order_id,
                    old_status = %old_status,
                    new_status = %new_status,
                    "Order status changed"
                );
            }
            Event::OrderClosed {
                order_id,
                bill_id,
                invoice_number,
            } => {
                info!(
                    order_id = %order_id,
                    bill_id = %bill_id,
                    invoice_number = %invoice_number,
                    "Order closed and billed"
                );
            }
            Event::BillPrinted { bill_id, transport } => {
                info!(bill_id = %bill_id, transport = %transport, "Bill printed");
            }
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_to_receiver() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);

        sender
            .send(Event::OrderCreated {
                order_id: 1,
                table_id: 3,
            })
            .await
            .expect("send should succeed");

        match rx.recv().await {
            Some(Event::OrderCreated { order_id, table_id }) => {
                assert_eq!(order_id, 1);
                assert_eq!(table_id, 3);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_fails_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        let result = sender.send(Event::MenuItemCreated(1)).await;
        assert!(result.is_err());
    }
}
