use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, SubscriptionGrantedEvent, TransactionAnnulledEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub subscription_granted_producer: Vec<EventProducer<SubscriptionGrantedEvent>>,
    pub transaction_annulled_producer: Vec<EventProducer<TransactionAnnulledEvent>>,
}

pub struct EventHandlers {
    pub on_subscription_granted: Option<EventHandler<SubscriptionGrantedEvent>>,
    pub on_transaction_annulled: Option<EventHandler<TransactionAnnulledEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_subscription_granted = hooks.on_subscription_granted.map(|f| EventHandler::new(buffer_size, f));
        let on_transaction_annulled = hooks.on_transaction_annulled.map(|f| EventHandler::new(buffer_size, f));
        Self { on_subscription_granted, on_transaction_annulled }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_subscription_granted {
            result.subscription_granted_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_transaction_annulled {
            result.transaction_annulled_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_subscription_granted {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_transaction_annulled {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_subscription_granted: Option<Handler<SubscriptionGrantedEvent>>,
    pub on_transaction_annulled: Option<Handler<TransactionAnnulledEvent>>,
}

impl EventHooks {
    pub fn on_subscription_granted<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(SubscriptionGrantedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_subscription_granted = Some(Arc::new(f));
        self
    }

    pub fn on_transaction_annulled<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(TransactionAnnulledEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_transaction_annulled = Some(Arc::new(f));
        self
    }
}
