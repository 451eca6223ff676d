use crate::component::{Component, ServiceCall, ServiceDescriptor, ServiceResult};
use crate::error::{DefinitionError, EngineFault};
use crate::params::{ParamType, ParameterDef};
use serde_json::json;
use tracing::debug;

pub const NAME: &str = "TestComponent";

fn foobar(call: &ServiceCall<'_>) -> Result<ServiceResult, EngineFault> {
    debug!(
        query = %call.text("query")?,
        num = call.number("num")?,
        foo_list = ?call.list("foo_list")?,
        bar_list = ?call.list("bar_list")?,
        "foobar called"
    );
    let inner = json!({
        "foo": "This is a test",
        "bar": {
            "some value": 1,
            "another value": "Some text",
            "some ArrayList": ["Blah", 12345]
        }
    });
    Ok(ServiceResult::ok(json!(["Some text", 123, inner])))
}

fn maker(call: &ServiceCall<'_>) -> Result<ServiceResult, EngineFault> {
    let request = json!({
        "params": { "some_parameter": call.text("api_key")? },
        "resource_creation_params": {
            "suggested_name": format!("{}_made", call.resource_name),
            "desc": "Description for my resource"
        }
    });
    let made = call
        .accessor
        .make_resource(super::sample::NAME, &request, false)?;
    Ok(ServiceResult::ok(format!(
        "Created a resource! Status: {} --- Name: {} --- URI: {}",
        made.status, made.name, made.uri
    )))
}

fn japanese(_call: &ServiceCall<'_>) -> Result<ServiceResult, EngineFault> {
    Ok(ServiceResult::ok("これは日本語のメッセージです。"))
}

pub fn component() -> Result<Component, DefinitionError> {
    Component::builder(NAME)
        .desc("This is a test component")
        .doc("Here is a doc string")
        .param("api_key", ParameterDef::required(ParamType::String, "This is the API key"))
        .param(
            "foo_1",
            ParameterDef::optional(ParamType::String, "This is a string choice type", "Foo B")
                .with_choices(["Foo A", "Foo B", "Foo C"])?,
        )
        .param(
            "foo_list",
            ParameterDef::optional(
                ParamType::StringList,
                "This is a string list choice type",
                "Foo B list item",
            )
            .with_choices(["Foo A list item", "Foo B list item", "Foo C list item"])?,
        )
        .param(
            "foo_2",
            ParameterDef::optional(ParamType::Number, "This is a number choice type", 3)
                .with_choices([1, 2, 3])?,
        )
        .param(
            "bar_list",
            ParameterDef::optional(ParamType::NumberList, "This is a numeric list choice type", 22)
                .with_choices([11, 22, 33, 44])?,
        )
        .service(
            "foobar",
            ServiceDescriptor::new("This is the foobar service")
                .param(
                    "query",
                    ParameterDef::optional(ParamType::String, "This is the query string", "foo"),
                )
                .param(
                    "num",
                    ParameterDef::optional(ParamType::Number, "The number of results", 10),
                )
                .positional(["query", "num"])
                .params_in_body()
                .no_input()
                .output_types(["application/json", "text/html", "text/plain"]),
            foobar,
        )
        .service(
            "maker",
            ServiceDescriptor::new("Makes another resource"),
            maker,
        )
        .service(
            "japanese",
            ServiceDescriptor::new("This returns Japanese message for test"),
            japanese,
        )
        .build()
}
