//! Module fixtures shared by the unit tests.
//!
//! Two small applications are provided:
//!
//! - [`controller_scenario`]: a controller holding a service behind an interface
//! - [`layered_scenario`]: a web controller calling a service, a generic repository and a
//!   data context, with constructions, getters, unresolvable calls and generic constraints
//! - [`wrapper_scenario`]: fields typed through arrays, by-reference wrappers and pointers

use crate::{
    metadata::{
        method::{MethodAttributes, MethodRef, Operand},
        module::Module,
        typesystem::{TypeBuilder, TypeRef, TypeRefRc, CORE_LIBRARY},
    },
    project::ModuleRegistry,
};

/// Module name of the controller scenario
pub const APP: &str = "App";

/// Module name of the layered scenario
pub const SHOP: &str = "Shop";

fn registry_of(module: Module) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    registry.add_module(module);
    registry
}

fn shop(full_name: &str) -> TypeRefRc {
    TypeRef::parse(full_name, SHOP)
}

/// `App.Controller` has a field of type `App.Service`, which implements `App.IService`
pub fn controller_scenario() -> ModuleRegistry {
    let service = TypeRef::parse("App.Service", APP);
    let iservice = TypeRef::parse("App.IService", APP);

    registry_of(Module::new(
        APP,
        vec![
            TypeBuilder::interface("App", "IService", APP)
                .method("Run", |run| run.abstract_method())
                .build(),
            TypeBuilder::class("App", "Service", APP)
                .extends(TypeRef::object())
                .implements(iservice)
                .constructor(|ctor| ctor)
                .method("Run", |run| run.flags(MethodAttributes::VIRTUAL))
                .build(),
            TypeBuilder::class("App", "Controller", APP)
                .extends(TypeRef::object())
                .field("service", service)
                .build(),
        ],
    ))
}

/// A three layer application.
///
/// `Shop.Web.TestApiController` constructs `Shop.Services.OrderService` and calls it through
/// `Shop.Services.IOrderService`. The service constructs a `Shop.Data.TestDataContext` and a
/// `Shop.Data.Repository<Shop.Model.Order>`, and calls `TestDataContext::Flush`, which does
/// not exist. The repository reads the context's `Connection` property and returns its
/// generic parameter `T : Shop.Model.Entity`.
pub fn layered_scenario() -> ModuleRegistry {
    let void = TypeRef::void();
    let int32 = TypeRef::plain("System", "Int32", CORE_LIBRARY);
    let connection_type = TypeRef::plain("System.Data", "IDbConnection", "System.Data");

    let entity = shop("Shop.Model.Entity");
    let order = shop("Shop.Model.Order");
    let context = shop("Shop.Data.TestDataContext");
    let repository = shop("Shop.Data.Repository`1");
    let t = TypeRef::generic_parameter("T", "Shop.Data.Repository`1", vec![entity.clone()]);
    let orders = TypeRef::generic_instance(repository, vec![order.clone()]);
    let iorders = shop("Shop.Services.IOrderService");
    let order_service = shop("Shop.Services.OrderService");

    let context_ctor = MethodRef::new(context.clone(), ".ctor", void.clone(), vec![]);
    let connection = MethodRef::new(context.clone(), "get_Connection", connection_type.clone(), vec![]);
    let flush = MethodRef::new(context.clone(), "Flush", void.clone(), vec![]);
    let orders_ctor = MethodRef::new(orders.clone(), ".ctor", void.clone(), vec![context.clone()]);
    let orders_get = MethodRef::new(orders.clone(), "Get", order.clone(), vec![int32.clone()]);
    let service_ctor = MethodRef::new(order_service, ".ctor", void, vec![]);
    let find_order = MethodRef::new(iorders.clone(), "Find", order.clone(), vec![int32.clone()]);

    registry_of(Module::new(
        SHOP,
        vec![
            TypeBuilder::class("Shop.Model", "Entity", SHOP)
                .abstract_type()
                .extends(TypeRef::object())
                .build(),
            TypeBuilder::class("Shop.Model", "Order", SHOP)
                .extends(entity)
                .build(),
            TypeBuilder::class("Shop.Data", "TestDataContext", SHOP)
                .extends(TypeRef::object())
                .constructor(|ctor| ctor)
                .getter("Connection", connection_type)
                .build(),
            TypeBuilder::class("Shop.Data", "Repository`1", SHOP)
                .extends(TypeRef::object())
                .generic_param(t.clone())
                .field("context", context.clone())
                .constructor(|ctor| ctor.param("context", context))
                .method("Get", |get| {
                    get.param("id", int32.clone())
                        .returns(t.clone())
                        .call(connection)
                        .type_op("castclass", t.clone())
                })
                .build(),
            TypeBuilder::interface("Shop.Services", "IOrderService", SHOP)
                .method("Find", |find| {
                    find.abstract_method()
                        .param("id", int32.clone())
                        .returns(order.clone())
                })
                .build(),
            TypeBuilder::class("Shop.Services", "OrderService", SHOP)
                .extends(TypeRef::object())
                .implements(iorders.clone())
                .field("repository", orders)
                .constructor(|ctor| ctor.newobj(context_ctor).newobj(orders_ctor))
                .method("Find", |find| {
                    find.flags(MethodAttributes::VIRTUAL | MethodAttributes::FINAL)
                        .param("id", int32.clone())
                        .returns(order.clone())
                        .callvirt(orders_get)
                })
                .method("Save", |save| save.param("order", order.clone()).call(flush))
                .build(),
            TypeBuilder::class("Shop.Web", "ControllerBase", SHOP)
                .abstract_type()
                .extends(TypeRef::object())
                .build(),
            TypeBuilder::class("Shop.Web", "TestApiController", SHOP)
                .extends(shop("Shop.Web.ControllerBase"))
                .field("orders", iorders)
                .constructor(|ctor| ctor.newobj(service_ctor))
                .method("Get", |get| {
                    get.param("id", int32.clone())
                        .returns(order.clone())
                        .callvirt(find_order)
                })
                .build(),
        ],
    ))
}

/// `App.Controller` holds `App.Item[]`, `App.Item&`, `App.Raw*` and a function pointer, and
/// declares a generic method `Convert<TOut>` that uses `TOut` nowhere in its signature.
/// `App.Item` references `App.Other`; `App.Raw` references `App.Hidden`.
pub fn wrapper_scenario() -> ModuleRegistry {
    let item = TypeRef::parse("App.Item", APP);
    let raw = TypeRef::parse("App.Raw", APP);
    let out = TypeRef::generic_parameter("TOut", "App.Controller::Convert", vec![]);

    registry_of(Module::new(
        APP,
        vec![
            TypeBuilder::class("App", "Item", APP)
                .field("other", TypeRef::parse("App.Other", APP))
                .build(),
            TypeBuilder::class("App", "Other", APP).build(),
            TypeBuilder::class("App", "Raw", APP)
                .field("hidden", TypeRef::parse("App.Hidden", APP))
                .build(),
            TypeBuilder::class("App", "Hidden", APP).build(),
            TypeBuilder::class("App", "Controller", APP)
                .field("items", TypeRef::array(item.clone(), 1))
                .field("slot", TypeRef::by_reference(item))
                .field("raw", TypeRef::pointer(raw))
                .field("callback", TypeRef::function_pointer(APP))
                .method("Convert", |convert| {
                    convert
                        .generic_param(out)
                        .param("value", TypeRef::plain("System", "Int32", CORE_LIBRARY))
                        .returns(TypeRef::object())
                        .op("ret", Operand::None)
                })
                .build(),
        ],
    ))
}
