use crate::prompt::PartialPrompt;
use crate::utils::ValueMap;
use anyhow::Result;

pub trait FillPlaceholders {
    fn placeholders_to_fill(&self) -> &Vec<String>;
}

pub trait Fill: FillPlaceholders {
    fn fill(&self, partial_prompt: &mut PartialPrompt) -> Result<()>;
}

pub trait FillMut: FillPlaceholders {
    fn fill_mut(&mut self, partial_prompt: &mut PartialPrompt) -> Result<()>;
}

/// Fills placeholders from a fixed [ValueMap].
///
/// Values for names that are not placeholders of the prompt are skipped, so one map can be reused across prompts.
#[derive(Debug, Clone, Default)]
pub struct MapFiller {
    values: ValueMap,
    placeholders_to_fill: Vec<String>,
}

impl MapFiller {
    pub fn new(values: ValueMap) -> Self {
        let mut placeholders_to_fill: Vec<String> = values.keys().cloned().collect();
        placeholders_to_fill.sort();
        Self {
            values,
            placeholders_to_fill,
        }
    }

    /// Parse `name=value` assignments. The value is everything after the first `=`.
    pub fn from_assignments<I, S>(assignments: I) -> Result<Self>
        where I: IntoIterator<Item=S>,
              S: AsRef<str> {
        let mut values = ValueMap::new();
        for assignment in assignments {
            let assignment = assignment.as_ref();
            let (name, value) = assignment
                .split_once('=')
                .ok_or_else(|| anyhow::anyhow!("expected name=value, got {:?}", assignment))?;
            values.insert(name.to_string(), value.to_string());
        }
        Ok(Self::new(values))
    }

    #[inline]
    pub fn values(&self) -> &ValueMap {
        &self.values
    }
}

impl FillPlaceholders for MapFiller {
    fn placeholders_to_fill(&self) -> &Vec<String> {
        &self.placeholders_to_fill
    }
}

impl Fill for MapFiller {
    fn fill(&self, partial_prompt: &mut PartialPrompt) -> Result<()> {
        for (placeholder, value) in &self.values {
            if partial_prompt.template.placeholders.contains(placeholder) {
                partial_prompt.try_fill(placeholder.as_str(), value.as_str())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test_filler {
    use super::{Fill, FillPlaceholders, MapFiller};
    use crate::prompt::PromptTemplate;

    #[test]
    fn test_from_assignments() {
        let filler = MapFiller::from_assignments(["tone=friendly", "goal=a=b", "empty="]).unwrap();
        assert_eq!(filler.values()["tone"], "friendly");
        assert_eq!(filler.values()["goal"], "a=b");
        assert_eq!(filler.values()["empty"], "");
        assert_eq!(filler.placeholders_to_fill(), &vec!["empty", "goal", "tone"]);

        assert!(MapFiller::from_assignments(["no equals sign"]).is_err());
    }

    #[test]
    fn test_fill_skips_unknown_names() {
        let template = PromptTemplate::new("Write a {tone} email to {client} about {goal}.");
        let mut prompt = template.construct_prompt();
        let filler = MapFiller::from_assignments(["tone=friendly", "client=Acme", "ghost=boo"]).unwrap();
        filler.fill(&mut prompt).unwrap();
        assert_eq!(prompt.render(), "Write a friendly email to Acme about {goal}.");
        assert_eq!(prompt.value("ghost"), None);
    }
}
