use crate::component::{Component, ServiceCall, ServiceDescriptor, ServiceResult};
use crate::error::{DefinitionError, EngineFault};
use crate::params::{ParamMap, ParamType, ParameterDef};
use chrono::{Duration, Local, NaiveDateTime};
use http::Method;
use tracing::debug;

pub const NAME: &str = "TimeRange";

/// Timestamp format expected by log-style base resources.
const TIME_FORMAT: &str = "%d/%b/%Y:%H:%M:%S";

fn time_str(t: NaiveDateTime) -> String {
    t.format(TIME_FORMAT).to_string()
}

fn window_service(desc: &str) -> ServiceDescriptor {
    ServiceDescriptor::new(desc)
        .param(
            "count_only",
            ParameterDef::optional(
                ParamType::Boolean,
                "If set then we only get the count of lines, not the lines themselves.",
                false,
            ),
        )
        .param(
            "filter",
            ParameterDef::optional(
                ParamType::String,
                "One or more filter expressions, separated by ';'. Prefix with '-' to exclude.",
                "",
            ),
        )
        .param(
            "unique_only",
            ParameterDef::optional(
                ParamType::Boolean,
                "If set then we only consider the first appearance of an IP address.",
                true,
            ),
        )
}

/// Forward the `[start, end]` window to the configured base resource.
fn forward(call: &ServiceCall<'_>, start: NaiveDateTime, end: NaiveDateTime) -> Result<ServiceResult, EngineFault> {
    let mut params = ParamMap::new();
    params.insert(call.text("start_time_name")?.to_string(), time_str(start).into());
    params.insert(call.text("end_time_name")?.to_string(), time_str(end).into());

    let optional = [
        ("count_flag_name", "count_only"),
        ("filter_name", "filter"),
        ("unique_only_name", "unique_only"),
    ];
    for (name_param, value_param) in optional {
        let target = call.text(name_param)?;
        if target.is_empty() {
            continue;
        }
        if let Some(value) = call.param(value_param) {
            params.insert(target.to_string(), value.clone());
        }
    }

    let base = call.text("base_resource")?;
    debug!(base_resource = %base, start = %time_str(start), end = %time_str(end), "Forwarding time range");
    Ok(call.accessor.access_resource(base, params, None, Method::GET))
}

fn midnight(t: NaiveDateTime) -> NaiveDateTime {
    t.date().and_hms_opt(0, 0, 0).unwrap_or(t)
}

fn current_time(_call: &ServiceCall<'_>) -> Result<ServiceResult, EngineFault> {
    Ok(ServiceResult::ok(time_str(Local::now().naive_local())))
}

fn today(call: &ServiceCall<'_>) -> Result<ServiceResult, EngineFault> {
    let now = Local::now().naive_local();
    forward(call, midnight(now), now)
}

fn yesterday(call: &ServiceCall<'_>) -> Result<ServiceResult, EngineFault> {
    let start = midnight(Local::now().naive_local() - Duration::days(1));
    forward(call, start, start + Duration::days(1))
}

fn last_days(call: &ServiceCall<'_>, days: i64) -> Result<ServiceResult, EngineFault> {
    let now = Local::now().naive_local();
    forward(call, now - Duration::days(days), now)
}

fn name_param(desc: &str, default: &str) -> ParameterDef {
    ParameterDef::optional(ParamType::String, desc, default)
}

pub fn component() -> Result<Component, DefinitionError> {
    Component::builder(NAME)
        .desc("Allows the selection of time ranges to be sent to other resources.")
        .doc("Computes common time windows and calls a base resource with them.")
        .param(
            "base_resource",
            ParameterDef::required(ParamType::Uri, "The URI of the resource that accepts time ranges"),
        )
        .param(
            "start_time_name",
            name_param("Name of the parameter for the base resource, which sets the start time", "start_time"),
        )
        .param(
            "end_time_name",
            name_param("Name of the parameter for the base resource, which sets the end time", "end_time"),
        )
        .param(
            "count_flag_name",
            name_param("Name of the flag to get only a log line count", "count_only"),
        )
        .param("filter_name", name_param("Name of the parameter to specify a filter", "filter"))
        .param(
            "unique_only_name",
            name_param(
                "Name of the parameter to specify whether we only want unique entries.",
                "unique_only",
            ),
        )
        .service(
            "current_time",
            ServiceDescriptor::new("The current time representation"),
            current_time,
        )
        .service("today", window_service("Today's entries"), today)
        .service("yesterday", window_service("Yesterday's entries"), yesterday)
        .service(
            "last7days",
            window_service("Entries over the last 7 days"),
            |call: &ServiceCall<'_>| last_days(call, 7),
        )
        .service(
            "last30days",
            window_service("Entries over the last 30 days"),
            |call: &ServiceCall<'_>| last_days(call, 30),
        )
        .service(
            "last90days",
            window_service("Entries over the last 90 days"),
            |call: &ServiceCall<'_>| last_days(call, 90),
        )
        .build()
}
