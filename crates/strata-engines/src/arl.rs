use strata_core::genome::Mep;
use strata_core::ops::{K_ARGS, OpSet, Opcode};
use strata_core::random_provider;
use strata_error::{StrataResult, strata_err};

/// Adaptive representation through learning: harvest a reusable subroutine
/// from the current best individual.
///
/// Existing auto-defined weights are decayed first; then a random block of
/// the best program either has some of its terminals generalized into
/// formal arguments (an ADF) or is wrapped whole as a parameterless ADT.
/// Either way the new op joins the set, where future individuals can call
/// it.
pub fn harvest(ops: &mut OpSet, best: &Mep) -> StrataResult<Option<Opcode>> {
    ops.reset_adf_weights();

    let blocks = best.blocks(ops);
    if blocks.is_empty() {
        return Ok(None);
    }

    let root = *random_provider::choose(&blocks);
    let candidate = best.get_block(root);

    if candidate.eff_size(ops) < 2 {
        return Ok(None);
    }

    if random_provider::bool(0.5) {
        return ops.insert_adt(candidate).map(Some);
    }

    let (body, loci) = candidate.generalize(K_ARGS, ops)?;
    if loci.is_empty() {
        return Err(strata_err!(Engine: "generalize substituted no terminals"));
    }

    let categories = loci.iter().map(|l| l.category).collect::<Vec<_>>();
    ops.insert_adf(body, &categories).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::environment::Environment;
    use strata_core::ops::Op;

    #[test]
    fn test_harvest_registers_a_subroutine() {
        let mut ops = OpSet::new();
        for op in Op::real_set(0, 1) {
            ops.insert(op);
        }

        let mut env = Environment::default();
        env.code_length = Some(30);

        // Random programs occasionally root in a terminal; retry until one
        // carries a block.
        let best = loop {
            let prg = Mep::random(&env, &ops);
            if !prg.blocks(&ops).is_empty() {
                break prg;
            }
        };

        let before = ops.len();
        let opcode = harvest(&mut ops, &best).unwrap();

        assert!(opcode.is_some());
        assert_eq!(ops.len(), before + 1);
        assert!(ops.get(opcode.unwrap()).is_auto_defined());
    }

    #[test]
    fn test_harvested_weights_decay_over_time() {
        let mut ops = OpSet::new();
        for op in Op::real_set(0, 1) {
            ops.insert(op);
        }

        let mut env = Environment::default();
        env.code_length = Some(30);

        let best = loop {
            let prg = Mep::random(&env, &ops);
            if !prg.blocks(&ops).is_empty() {
                break prg;
            }
        };

        let opcode = harvest(&mut ops, &best).unwrap().unwrap();
        let w0 = ops.get(opcode).weight();

        ops.reset_adf_weights();
        assert!(ops.get(opcode).weight() < w0);
    }
}
