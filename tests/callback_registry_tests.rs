use docmutate::{
    CallbackDefinition, CallbackPhase, CallbackRegistry, Crud, EntityType, ExecutionMode,
    GroupPermissions, MutationOptions, ReturnShape,
};
use std::collections::HashSet;
use std::sync::Arc;

#[test]
fn test_registering_posts_yields_twelve_unique_definitions() {
    let registry = CallbackRegistry::new();
    let added = registry
        .register_collection_callbacks(&EntityType::new("Posts"))
        .unwrap();
    assert_eq!(added, 12);

    let definitions = registry.definitions().unwrap();
    let names: HashSet<&str> = definitions.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names.len(), 12);

    for action in ["create", "update", "delete"] {
        for phase in ["validate", "before", "after", "async"] {
            let name = format!("posts.{action}.{phase}");
            let definition = registry.get(&name).unwrap().unwrap_or_else(|| panic!("{name} missing"));
            let expected_mode = if phase == "async" {
                ExecutionMode::Async
            } else {
                ExecutionMode::Sync
            };
            assert_eq!(definition.mode, expected_mode, "{name}");
            assert!(!definition.arguments.is_empty(), "{name}");
            assert!(!definition.description.is_empty(), "{name}");
        }
    }
}

#[test]
fn test_documented_argument_lists() {
    let registry = CallbackRegistry::new();
    registry
        .register_collection_callbacks(&EntityType::new("Posts"))
        .unwrap();
    let args = |name: &str| {
        registry
            .get(name)
            .unwrap()
            .unwrap()
            .argument_names()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>()
    };

    assert_eq!(args("posts.create.validate"), ["document", "currentUser", "validationErrors"]);
    assert_eq!(args("posts.create.before"), ["document", "currentUser"]);
    assert_eq!(args("posts.update.after"), ["newDocument", "document", "currentUser"]);
    assert_eq!(args("posts.delete.async"), ["document", "currentUser", "collection"]);
    assert_eq!(
        registry.get("posts.update.validate").unwrap().unwrap().returns,
        ReturnShape::Modifier
    );
}

#[test]
fn test_custom_definitions_can_be_registered_next_to_generated_ones() {
    let registry = CallbackRegistry::new();
    registry
        .register_collection_callbacks(&EntityType::new("Posts"))
        .unwrap();
    let custom = CallbackDefinition::new("posts.approve.after", CallbackPhase::After)
        .argument("document", "The approved post")
        .returns(ReturnShape::Document)
        .description("Runs after a post is approved");

    assert!(registry.register_callback(custom.clone()).unwrap());
    assert!(!registry.register_callback(custom).unwrap());
    assert_eq!(registry.len().unwrap(), 13);
}

#[test]
fn test_shared_registry_collects_every_entity_type_and_can_be_reset() {
    let registry = Arc::new(CallbackRegistry::new());
    let crud = Crud::with_registry(Arc::new(GroupPermissions::new()), registry.clone());
    crud.build_mutations("Posts", MutationOptions::new()).unwrap();
    crud.build_mutations("Comments", MutationOptions::new().delete(false))
        .unwrap();

    assert_eq!(registry.len().unwrap(), 24);
    assert!(registry.contains("comments.delete.before").unwrap());

    registry.reset().unwrap();
    assert!(registry.is_empty().unwrap());
}
