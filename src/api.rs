//! HTTP surface for the Ring and Data services (§6), mapping each wire
//! operation onto the matching `Ring` method. Internal RPC paths here must
//! match the URLs `rpc_client.rs` dials on peers.
use actix_web::{web, HttpResponse};

use crate::error::ChordResult;
use crate::ring::Ring;
use crate::wire::*;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(join)
        .service(leave)
        .service(get_data)
        .service(get_finger_table)
        .service(clear_hops)
        .service(internal_find_successor)
        .service(internal_closest_preceding_finger)
        .service(internal_get_successor)
        .service(internal_get_predecessor)
        .service(internal_set_successor)
        .service(internal_set_predecessor)
        .service(internal_update_finger_table)
        .service(internal_fix_finger_table)
        .service(internal_request_data)
        .service(internal_store);
}

#[actix_web::post("/join")]
async fn join(ring: web::Data<Ring>, body: web::Json<JoinRequest>) -> ChordResult<HttpResponse> {
    let num_hops = ring.join(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(HopsResponse { num_hops }))
}

#[actix_web::post("/leave")]
async fn leave(ring: web::Data<Ring>) -> ChordResult<HttpResponse> {
    let num_hops = ring.leave().await?;
    Ok(HttpResponse::Ok().json(HopsResponse { num_hops }))
}

#[actix_web::get("/data")]
async fn get_data(ring: web::Data<Ring>, query: web::Query<GetDataQuery>) -> HttpResponse {
    let records = ring.fetch_data(&query.education, query.max_awards);
    HttpResponse::Ok().json(RecordsPayload { data: records })
}

#[actix_web::get("/finger-table")]
async fn get_finger_table(ring: web::Data<Ring>) -> HttpResponse {
    HttpResponse::Ok().json(ring.get_finger_table_view().await)
}

#[actix_web::post("/clear-hops")]
async fn clear_hops(ring: web::Data<Ring>) -> HttpResponse {
    HttpResponse::Ok().json(HopsResponse { num_hops: ring.clear_hops() })
}

#[actix_web::get("/internal/find-successor")]
async fn internal_find_successor(
    ring: web::Data<Ring>,
    query: web::Query<FindSuccessorQuery>,
) -> ChordResult<HttpResponse> {
    let node = ring.find_successor(query.key_id).await?;
    Ok(HttpResponse::Ok().json(node))
}

#[actix_web::get("/internal/closest-preceding-finger")]
async fn internal_closest_preceding_finger(
    ring: web::Data<Ring>,
    query: web::Query<FindSuccessorQuery>,
) -> ChordResult<HttpResponse> {
    let node = ring.closest_preceding_finger_local(query.key_id).await?;
    Ok(HttpResponse::Ok().json(node))
}

#[actix_web::get("/internal/successor")]
async fn internal_get_successor(ring: web::Data<Ring>) -> HttpResponse {
    HttpResponse::Ok().json(ring.get_successor_local().await)
}

#[actix_web::get("/internal/predecessor")]
async fn internal_get_predecessor(ring: web::Data<Ring>) -> HttpResponse {
    HttpResponse::Ok().json(ring.get_predecessor_local().await)
}

#[actix_web::post("/internal/set-successor")]
async fn internal_set_successor(ring: web::Data<Ring>, body: web::Json<SetPeerRequest>) -> HttpResponse {
    let node = ring.node_info_for(&body.ip_addr);
    ring.set_successor_local(node).await;
    HttpResponse::Ok().finish()
}

#[actix_web::post("/internal/set-predecessor")]
async fn internal_set_predecessor(ring: web::Data<Ring>, body: web::Json<SetPeerRequest>) -> HttpResponse {
    let node = ring.node_info_for(&body.ip_addr);
    ring.set_predecessor_local(node).await;
    HttpResponse::Ok().finish()
}

#[actix_web::post("/internal/update-finger-table")]
async fn internal_update_finger_table(
    ring: web::Data<Ring>,
    body: web::Json<UpdateFingerTableRequest>,
) -> ChordResult<HttpResponse> {
    let req = body.into_inner();
    ring.update_finger_table_local(req.node, req.index).await?;
    Ok(HttpResponse::Ok().finish())
}

#[actix_web::post("/internal/fix-finger-table")]
async fn internal_fix_finger_table(
    ring: web::Data<Ring>,
    body: web::Json<FixFingerTableRequest>,
) -> ChordResult<HttpResponse> {
    let req = body.into_inner();
    ring.fix_finger_table_local(&req.leaver_addr, req.successor, req.index).await?;
    Ok(HttpResponse::Ok().finish())
}

#[actix_web::get("/internal/request-data")]
async fn internal_request_data(
    ring: web::Data<Ring>,
    query: web::Query<JoiningNodeQuery>,
) -> ChordResult<HttpResponse> {
    let records = ring.take_data_for_joiner(query.node_id)?;
    Ok(HttpResponse::Ok().json(RecordsPayload { data: records }))
}

#[actix_web::post("/internal/store")]
async fn internal_store(ring: web::Data<Ring>, body: web::Json<RecordsPayload>) -> ChordResult<HttpResponse> {
    ring.store_records(body.into_inner().data)?;
    Ok(HttpResponse::Ok().finish())
}
