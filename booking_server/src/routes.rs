//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. For this reason, any long, non-cpu-bound operation (e.g. I/O,
//! database operations, the outbound gateway call) is expressed as a future or asynchronous function so the worker can
//! interleave other requests.

use std::str::FromStr;

use actix_web::{get, http::header::LOCATION, web, HttpResponse, Responder};
use booking_engine::{
    db_types::{BookingStatus, OrderId},
    BookingApi,
    BookingFlowApi,
    BookingGatewayDatabase,
    BookingManagement,
    BookingQueryFilter,
    ReconciliationOutcome,
};
use hbg_common::Vnd;
use log::*;
use momo_gateway::MomoApi;

use crate::{
    data_objects::{
        AvailabilityQuery,
        BookingSearchQuery,
        InitiatePaymentRequest,
        JsonResponse,
        MomoNotifyPayload,
        MomoReturnQuery,
        NewBookingRequest,
        PayUrlResponse,
        StatusUpdateRequest,
    },
    errors::ServerError,
    integrations::momo::initiate_momo_payment,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------  Bookings  ----------------------------------------------------
route!(create_booking => Post "/bookings" impl BookingGatewayDatabase);
/// Creates a new `pending` booking.
///
/// The availability check and the insert are atomic in the backend, so a lost race against a concurrent
/// overlapping request surfaces as a 409 rather than a double booking.
pub async fn create_booking<B>(
    api: web::Data<BookingFlowApi<B>>,
    body: web::Json<NewBookingRequest>,
) -> Result<HttpResponse, ServerError>
where
    B: BookingGatewayDatabase,
{
    let request = body.into_inner();
    trace!("💻️ Received booking request for room {}", request.room_id);
    let booking = api.create_booking(request.into()).await?;
    Ok(HttpResponse::Created().json(booking))
}

route!(booking_by_id => Get "/bookings/{id}" impl BookingManagement);
pub async fn booking_by_id<B>(
    api: web::Data<BookingApi<B>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ServerError>
where
    B: BookingManagement,
{
    let booking_id = path.into_inner();
    let booking = api
        .booking_by_id(booking_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Booking {booking_id} does not exist")))?;
    Ok(HttpResponse::Ok().json(booking))
}

route!(search_bookings => Get "/bookings" impl BookingManagement);
/// Admin booking search across users and rooms, optionally narrowed to one status.
pub async fn search_bookings<B>(
    api: web::Data<BookingApi<B>>,
    query: web::Query<BookingSearchQuery>,
) -> Result<HttpResponse, ServerError>
where
    B: BookingManagement,
{
    let q = query.into_inner();
    let mut filter = BookingQueryFilter::default();
    if let Some(user_id) = q.user_id {
        filter = filter.with_user_id(user_id);
    }
    if let Some(room_id) = q.room_id {
        filter = filter.with_room_id(room_id);
    }
    if let Some(status) = q.status.as_deref() {
        let status = BookingStatus::from_str(status).map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?;
        filter = filter.with_status(status);
    }
    let bookings = api.search_bookings(filter).await?;
    Ok(HttpResponse::Ok().json(bookings))
}

route!(booking_payments => Get "/bookings/{id}/payments" impl BookingManagement);
pub async fn booking_payments<B>(
    api: web::Data<BookingApi<B>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ServerError>
where
    B: BookingManagement,
{
    let booking_id = path.into_inner();
    let payments = api.payments_for_booking(booking_id).await?;
    Ok(HttpResponse::Ok().json(payments))
}

route!(booking_by_order_id => Get "/payment/momo/orders/{order_id}" impl BookingManagement);
/// Looks a booking up by its gateway correlation id. This is what support staff use when a guest quotes
/// the order id from the fallback page.
pub async fn booking_by_order_id<B>(
    api: web::Data<BookingApi<B>>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServerError>
where
    B: BookingManagement,
{
    let order_id = OrderId::from(path.into_inner());
    let booking = api
        .booking_by_order_id(&order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("No booking references order {order_id}")))?;
    Ok(HttpResponse::Ok().json(booking))
}

route!(bookings_for_user => Get "/users/{id}/bookings" impl BookingManagement);
pub async fn bookings_for_user<B>(
    api: web::Data<BookingApi<B>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ServerError>
where
    B: BookingManagement,
{
    let user_id = path.into_inner();
    let bookings = api.bookings_for_user(user_id).await?;
    Ok(HttpResponse::Ok().json(bookings))
}

route!(update_booking_status => Post "/bookings/{id}/status" impl BookingGatewayDatabase);
/// Admin transition. The permitted moves are enforced by the engine's transition table; anything out of
/// a terminal status comes back as a 409.
pub async fn update_booking_status<B>(
    api: web::Data<BookingFlowApi<B>>,
    path: web::Path<i64>,
    body: web::Json<StatusUpdateRequest>,
) -> Result<HttpResponse, ServerError>
where
    B: BookingGatewayDatabase,
{
    let booking_id = path.into_inner();
    let new_status = BookingStatus::from_str(&body.status)
        .map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?;
    let booking = api.set_status_for_booking(booking_id, new_status).await?;
    Ok(HttpResponse::Ok().json(booking))
}

//----------------------------------------------    Rooms   ----------------------------------------------------
route!(room_availability => Get "/rooms/{id}/availability" impl BookingGatewayDatabase);
/// Availability probe for one room. A degenerate range reports unavailable; a storage fault answers
/// according to the configured fail mode.
pub async fn room_availability<B>(
    api: web::Data<BookingFlowApi<B>>,
    path: web::Path<i64>,
    query: web::Query<AvailabilityQuery>,
) -> Result<HttpResponse, ServerError>
where
    B: BookingGatewayDatabase,
{
    let room_id = path.into_inner();
    let available = api.check_availability(room_id, query.check_in, query.check_out).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "roomId": room_id, "available": available })))
}

route!(search_rooms => Get "/rooms/search" impl BookingManagement);
/// All rooms annotated with availability for the requested range, as the search screen shows them.
pub async fn search_rooms<B>(
    api: web::Data<BookingApi<B>>,
    query: web::Query<AvailabilityQuery>,
) -> Result<HttpResponse, ServerError>
where
    B: BookingManagement,
{
    let rooms = api.rooms_with_availability(query.check_in, query.check_out).await?;
    Ok(HttpResponse::Ok().json(rooms))
}

//----------------------------------------------   Payment  ----------------------------------------------------
route!(momo_create => Post "/payment/momo/create" impl BookingGatewayDatabase);
/// Initiates a wallet payment and returns the `payUrl` the storefront redirects the guest to.
pub async fn momo_create<B>(
    api: web::Data<BookingFlowApi<B>>,
    momo: web::Data<MomoApi>,
    body: web::Json<InitiatePaymentRequest>,
) -> Result<HttpResponse, ServerError>
where
    B: BookingGatewayDatabase,
{
    let request = body.into_inner();
    trace!("💻️ Received payment initiation request for booking {}", request.booking_id);
    let pay_url = initiate_momo_payment(api.get_ref(), momo.get_ref(), request.booking_id, request.discount_code).await?;
    Ok(HttpResponse::Ok().json(PayUrlResponse { pay_url }))
}

route!(momo_notify => Post "/payment/momo/notify" impl BookingGatewayDatabase);
/// The gateway's server-to-server notification (IPN) channel, delivered at-least-once in any order
/// relative to the browser return.
///
/// Every *domain* outcome — settled, already settled, or an unknown order id — is acknowledged with a
/// 200 so the gateway stops redelivering. Only a storage failure propagates as a 500, which is exactly
/// the signal the gateway needs to redeliver later.
pub async fn momo_notify<B>(
    api: web::Data<BookingFlowApi<B>>,
    body: web::Json<MomoNotifyPayload>,
) -> Result<HttpResponse, ServerError>
where
    B: BookingGatewayDatabase,
{
    let payload = body.into_inner();
    let order_id = OrderId::from(payload.order_id.clone());
    debug!("💻️💳️ Notify callback for order [{order_id}] with resultCode {}", payload.result_code);
    api.settle(&order_id, payload.result_code, Vnd::from(payload.amount)).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("acknowledged")))
}

route!(momo_return => Get "/payment/momo/return" impl BookingGatewayDatabase);
/// The browser return channel. The guest lands here after the wallet app closes; the verdict in the
/// query string is the same one the notify channel carries, so settling is idempotent across the two.
///
/// The gateway never replays this channel, so a storage failure cannot be answered with "retry": the
/// guest is redirected to a support page quoting the order id instead of silently losing the payment.
pub async fn momo_return<B>(
    api: web::Data<BookingFlowApi<B>>,
    query: web::Query<MomoReturnQuery>,
) -> Result<HttpResponse, ServerError>
where
    B: BookingGatewayDatabase,
{
    let q = query.into_inner();
    let order_id = OrderId::from(q.order_id.clone());
    debug!("💻️💳️ Return redirect for order [{order_id}] with resultCode {}", q.result_code);
    let location = match api.settle(&order_id, q.result_code, Vnd::from(q.amount.unwrap_or_default())).await {
        Ok(ReconciliationOutcome::Settled { booking, .. }) | Ok(ReconciliationOutcome::AlreadySettled(booking)) => {
            format!("/payment/result?bookingId={}&status={}", booking.id, booking.status)
        },
        Ok(ReconciliationOutcome::Unmatched) => {
            warn!("💻️💳️ Return redirect carries unknown order [{order_id}]");
            "/payment/result?status=error".to_string()
        },
        Err(e) => {
            error!("💻️💳️ Could not settle order [{order_id}] from the return channel: {e}");
            format!("/payment/result?status=support&orderId={order_id}")
        },
    };
    Ok(HttpResponse::SeeOther().insert_header((LOCATION, location)).finish())
}
