use kube::Resource;

use autoconfig_domain::OwnerObject;

/// Describes any Kubernetes object as a prospective artifact owner.
pub fn owner_object<K: Resource>(obj: &K, dt: &K::DynamicType) -> OwnerObject {
    let meta = obj.meta();
    OwnerObject {
        api_version: K::api_version(dt).into_owned(),
        kind: K::kind(dt).into_owned(),
        name: meta.name.clone().unwrap_or_default(),
        namespace: meta.namespace.clone(),
        uid: meta.uid.clone(),
    }
}
