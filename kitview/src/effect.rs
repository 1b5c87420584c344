use crate::state::GeneratorKind;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    GenerateMap {
        generator: GeneratorKind,
        seed: u64,
        width: u16,
        height: u16,
    },
}
