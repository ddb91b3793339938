use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{BookingPaidEvent, EventHandler, EventProducer, Handler};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub booking_paid_producer: Vec<EventProducer<BookingPaidEvent>>,
}

pub struct EventHandlers {
    pub on_booking_paid: Option<EventHandler<BookingPaidEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_booking_paid = hooks.on_booking_paid.map(|f| EventHandler::new(buffer_size, f));
        Self { on_booking_paid }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_booking_paid {
            result.booking_paid_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_booking_paid {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_booking_paid: Option<Handler<BookingPaidEvent>>,
}

impl EventHooks {
    pub fn on_booking_paid<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(BookingPaidEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_booking_paid = Some(Arc::new(f));
        self
    }
}
