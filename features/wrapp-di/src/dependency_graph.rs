use std::collections::{BTreeMap, HashSet};

use thiserror::Error;

use crate::{builder::DiBuilder, factories::Dependency, token::InjectionToken};

/// Graph of the entire application
/// Used to check for missing and circular dependencies before anything is constructed
pub struct DependencyGraph {
    map: BTreeMap<InjectionToken, DependencyGraphEntry>,
    /// Issues found while building the graph
    issues: Vec<DependencyGraphError>,
}
impl DependencyGraph {
    pub fn new(builder: &DiBuilder) -> Self {
        let mut graph = Self {
            map: Default::default(),
            issues: builder.issues.clone(),
        };

        for provider in &builder.providers {
            graph.add(provider.token(), provider.dependencies().to_vec());
        }

        graph
    }

    fn add(&mut self, token: InjectionToken, dependencies: Vec<Dependency>) {
        if self.map.contains_key(&token) {
            self.issues.push(DependencyGraphError::Duplicate(token));
            return;
        }

        self.map.insert(
            token,
            DependencyGraphEntry {
                token,
                dependencies,
            },
        );
    }

    pub fn contains(&self, token: &InjectionToken) -> bool {
        self.map.contains_key(token)
    }

    /// Declared dependencies of a registered token
    pub fn dependencies_of(&self, token: &InjectionToken) -> Option<&[Dependency]> {
        self.map
            .get(token)
            .map(|entry| entry.dependencies.as_slice())
    }

    /// Validate the graph
    ///
    /// Returns a list of all issues
    pub fn check(&self) -> Result<(), DependencyGraphErrors> {
        let mut checked = HashSet::new();
        let mut errors = self.issues.clone();
        for entry in self.map.values() {
            let mut dependency_chain = Vec::new();
            check_recurse(
                self,
                &mut checked,
                &mut errors,
                &mut dependency_chain,
                entry,
            );
        }

        if !errors.is_empty() {
            return Err(DependencyGraphErrors { errors });
        }

        return Ok(());

        fn check_recurse(
            graph: &DependencyGraph,
            checked: &mut HashSet<InjectionToken>,
            errors: &mut Vec<DependencyGraphError>,
            dependency_chain: &mut Vec<InjectionToken>,
            entry: &DependencyGraphEntry,
        ) {
            // Circular Dependency Check
            if let Some(start) = dependency_chain.iter().position(|t| *t == entry.token) {
                let mut chain = dependency_chain[start..].to_vec();
                chain.push(entry.token);

                errors.push(DependencyGraphError::CircularDependency {
                    from: dependency_chain[start],
                    to: dependency_chain[dependency_chain.len() - 1],
                    chain,
                });
                return;
            }

            // Skip other checks if already checked
            if !checked.insert(entry.token) {
                return;
            };

            dependency_chain.push(entry.token);

            for dependency in &entry.dependencies {
                let Some(next_entry) = graph.map.get(&dependency.token) else {
                    if !dependency.optional {
                        errors.push(DependencyGraphError::MissingDependency {
                            dependency: dependency.token,
                            required_by: entry.token,
                        });
                    }

                    continue;
                };

                check_recurse(graph, checked, errors, dependency_chain, next_entry);
            }

            dependency_chain.pop();
        }
    }
}

struct DependencyGraphEntry {
    token: InjectionToken,
    dependencies: Vec<Dependency>,
}

#[derive(Error, Debug, Clone)]
pub enum DependencyGraphError {
    #[error("A token has been registered twice: '{0}'")]
    Duplicate(InjectionToken),
    #[error("'{required_by}' needs '{dependency}' but it is missing")]
    MissingDependency {
        dependency: InjectionToken,
        required_by: InjectionToken,
    },
    #[error("A Circular Dependency exists between '{from}' and '{to}' through {chain:?}")]
    CircularDependency {
        from: InjectionToken,
        to: InjectionToken,
        chain: Vec<InjectionToken>,
    },
    #[error("Module '{module}' exports '{token}' which it neither provides nor imports")]
    UnknownExport {
        module: &'static str,
        token: InjectionToken,
    },
}
impl std::fmt::Display for DependencyGraphErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut display = Vec::new();
        display.push("The dependency graph had one or more errors:".to_string());
        for error in &self.errors {
            display.push(format!("- {}", error));
        }
        f.write_str(&display.join("\n"))
    }
}

#[derive(Error, Debug, Clone)]
pub struct DependencyGraphErrors {
    pub errors: Vec<DependencyGraphError>,
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;
    use crate::{module::ModuleDescriptor, provider::Provider};

    const A: InjectionToken = InjectionToken::named("A");
    const B: InjectionToken = InjectionToken::named("B");
    const C: InjectionToken = InjectionToken::named("C");

    fn depends_on(token: InjectionToken, inject: Vec<Dependency>) -> Provider {
        Provider::factory(token, inject, |_| async { Ok::<_, Infallible>(()) })
    }

    fn errors_of(builder: DiBuilder) -> Vec<DependencyGraphError> {
        match DependencyGraph::new(&builder).check() {
            Ok(()) => Vec::new(),
            Err(errors) => errors.errors,
        }
    }

    #[test]
    fn valid_graph_passes() {
        let builder = DiBuilder::new()
            .add_value(A, 1u8)
            .add_provider(depends_on(B, vec![A.into()]))
            .add_provider(depends_on(C, vec![A.into(), B.into()]));

        let graph = DependencyGraph::new(&builder);
        assert!(graph.check().is_ok());
        assert_eq!(
            graph.dependencies_of(&C),
            Some([Dependency::required(A), Dependency::required(B)].as_slice())
        );
    }

    #[test]
    fn reports_duplicates_and_missing_dependencies() {
        let builder = DiBuilder::new()
            .add_value(A, 1u8)
            .add_value(A, 2u8)
            .add_provider(depends_on(B, vec![C.into()]));

        let errors = errors_of(builder);
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], DependencyGraphError::Duplicate(token) if token == A));
        assert!(matches!(
            errors[1],
            DependencyGraphError::MissingDependency { dependency, required_by } if dependency == C && required_by == B
        ));
    }

    #[test]
    fn missing_optional_dependency_is_fine() {
        let builder = DiBuilder::new().add_provider(depends_on(B, vec![Dependency::optional(C)]));

        assert!(errors_of(builder).is_empty());
    }

    #[test]
    fn reports_circular_dependencies() {
        let builder = DiBuilder::new()
            .add_provider(depends_on(A, vec![B.into()]))
            .add_provider(depends_on(B, vec![C.into()]))
            .add_provider(depends_on(C, vec![A.into()]));

        let errors = errors_of(builder);
        assert_eq!(errors.len(), 1);
        let DependencyGraphError::CircularDependency { from, to, chain } = &errors[0] else {
            panic!("expected a circular dependency, got {:?}", errors[0]);
        };
        assert_eq!(*from, A);
        assert_eq!(*to, C);
        assert_eq!(chain, &vec![A, B, C, A]);
    }

    #[test]
    fn reports_exports_which_are_not_provided() {
        let module = ModuleDescriptor::new("Broken")
            .with_providers([Provider::value(A, 1u8)])
            .with_exports([A, B]);

        let errors = errors_of(DiBuilder::new().import(module));
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            DependencyGraphError::UnknownExport { module: "Broken", token } if token == B
        ));
    }
}
