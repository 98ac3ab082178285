//! Qualified names of the Core vocabulary terms.

pub const DESCRIPTION: &str = "Org.OData.Core.V1.Description";
pub const LONG_DESCRIPTION: &str = "Org.OData.Core.V1.LongDescription";
pub const IS_LANGUAGE_DEPENDENT: &str = "Org.OData.Core.V1.IsLanguageDependent";
pub const REQUIRES_TYPE: &str = "Org.OData.Core.V1.RequiresType";
pub const RESOURCE_PATH: &str = "Org.OData.Core.V1.ResourcePath";
pub const DEREFERENCEABLE_IDS: &str = "Org.OData.Core.V1.DereferenceableIDs";
pub const CONVENTIONAL_IDS: &str = "Org.OData.Core.V1.ConventionalIDs";
pub const IMMUTABLE: &str = "Org.OData.Core.V1.Immutable";
pub const COMPUTED: &str = "Org.OData.Core.V1.Computed";
pub const IS_URL: &str = "Org.OData.Core.V1.IsURL";
pub const ACCEPTABLE_MEDIA_TYPES: &str = "Org.OData.Core.V1.AcceptableMediaTypes";
pub const MEDIA_TYPE: &str = "Org.OData.Core.V1.MediaType";
pub const IS_MEDIA_TYPE: &str = "Org.OData.Core.V1.IsMediaType";
pub const OPTIMISTIC_CONCURRENCY_CONTROL: &str = "Org.OData.Core.V1.OptimisticConcurrencyControl";
pub const OPTIMISTIC_CONCURRENCY: &str = "Org.OData.Core.V1.OptimisticConcurrency";

/// The structured type behind [`OPTIMISTIC_CONCURRENCY_CONTROL`].
pub const OPTIMISTIC_CONCURRENCY_CONTROL_TYPE: &str =
    "Org.OData.Core.V1.OptimisticConcurrencyControlType";

/// Every Core term, in declaration order.
pub const ALL_TERMS: [&str; 15] = [
    DESCRIPTION,
    LONG_DESCRIPTION,
    IS_LANGUAGE_DEPENDENT,
    REQUIRES_TYPE,
    RESOURCE_PATH,
    DEREFERENCEABLE_IDS,
    CONVENTIONAL_IDS,
    IMMUTABLE,
    COMPUTED,
    IS_URL,
    ACCEPTABLE_MEDIA_TYPES,
    MEDIA_TYPE,
    IS_MEDIA_TYPE,
    OPTIMISTIC_CONCURRENCY_CONTROL,
    OPTIMISTIC_CONCURRENCY,
];
